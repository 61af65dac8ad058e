//! Identity store access and the guard that runs on mount.

use tracing::warn;

use crate::navigation::{ErrorPayload, Navigator, View};

/// Read-only view of the persisted user identity.
pub trait IdentitySource: Send + Sync {
    /// The stored username, if any.
    fn identity(&self) -> Option<String>;
}

/// Fixed identity, for embedding the controller where the identity is
/// already known.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(Some(identity.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentitySource for StaticIdentity {
    fn identity(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolve the acting identity or redirect to the unauthorized error view.
///
/// Blank identities count as absent. On `None` the navigator has already
/// been sent to [`View::Error`] exactly once and the caller must do nothing
/// else.
pub fn guard(source: &dyn IdentitySource, navigator: &dyn Navigator) -> Option<String> {
    let identity = source
        .identity()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    if identity.is_none() {
        warn!("no stored identity, redirecting to error view");
        navigator.navigate(View::Error(ErrorPayload::unauthorized()));
    }
    identity
}
