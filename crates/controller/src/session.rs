//! Liveness, teardown signal and view publishing for one mounted session.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{watch, Notify};

use crate::tracker::ControllerView;

/// Shared between the session task and its [`ControllerHandle`].
///
/// `close` clears the liveness flag and stores a shutdown permit, so a
/// teardown that races the task is observed at its next suspension point.
/// Once closed, [`SessionLink::publish`] is a no-op.
///
/// [`ControllerHandle`]: crate::controller::ControllerHandle
pub struct SessionLink {
    alive: AtomicBool,
    shutdown: Notify,
    views: watch::Sender<ControllerView>,
}

impl Default for SessionLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLink {
    pub fn new() -> Self {
        let (views, _) = watch::channel(ControllerView::default());
        Self {
            alive: AtomicBool::new(true),
            shutdown: Notify::new(),
            views,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Tear the session down. Idempotent.
    pub fn close(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            self.shutdown.notify_one();
        }
    }

    /// Resolves once [`SessionLink::close`] has been called.
    pub async fn cancelled(&self) {
        if !self.is_alive() {
            return;
        }
        self.shutdown.notified().await;
    }

    /// Publish a new view. Returns `false` if the session is already closed.
    pub fn publish(&self, view: ControllerView) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.views.send_replace(view);
        true
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerView> {
        self.views.subscribe()
    }

    pub fn current(&self) -> ControllerView {
        self.views.borrow().clone()
    }
}
