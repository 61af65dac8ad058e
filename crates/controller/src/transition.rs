//! Handoff out of the loading view once the job is terminal.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::navigation::{Navigator, View};
use crate::session::SessionLink;

/// Performs the single delayed navigation to the chat view.
pub struct TransitionDriver {
    navigator: Arc<dyn Navigator>,
    grace: Duration,
    fired: bool,
}

impl TransitionDriver {
    pub fn new(navigator: Arc<dyn Navigator>, grace: Duration) -> Self {
        Self {
            navigator,
            grace,
            fired: false,
        }
    }

    /// Wait out the grace delay, then enter the chat view.
    ///
    /// Returns `true` if the navigation happened. Returns `false` without
    /// navigating if the session closed during the delay or the handoff
    /// already ran.
    pub async fn hand_off(&mut self, link: &SessionLink) -> bool {
        if self.fired {
            return false;
        }

        tokio::select! {
            biased;
            _ = link.cancelled() => {
                info!("session closed during ready grace delay, skipping handoff");
                return false;
            }
            _ = tokio::time::sleep(self.grace) => {}
        }

        if !link.is_alive() {
            return false;
        }
        self.fired = true;
        info!(grace_ms = self.grace.as_millis() as u64, "job ready, entering chat view");
        self.navigator.navigate(View::Chat);
        true
    }

    /// Terminal failure: stay on the loading view with the error shown.
    pub fn halt(&self, message: &str) {
        error!(error = %message, "ingestion job failed, no automatic navigation");
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
