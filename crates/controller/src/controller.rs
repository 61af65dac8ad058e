//! The loading controller: mount, drive one job to a terminal state, unmount.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use ragreader_core::{JobStatus, PollingConfig};

use crate::api::JobApi;
use crate::identity::{self, IdentitySource};
use crate::initiator::{JobInitiator, StartAttempt, INITIATION_FAILED_MESSAGE};
use crate::navigation::Navigator;
use crate::scheduler::{PollExit, PollScheduler};
use crate::session::SessionLink;
use crate::tracker::{ControllerView, StatusTracker, DEFAULT_FAILURE_MESSAGE};
use crate::transition::TransitionDriver;

/// How a mounted session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// No identity was stored; the error view was shown.
    Unauthorized,
    /// The job could not be created. No polling happened.
    InitiationFailed(String),
    /// The job became ready and the chat view was entered.
    Ready,
    /// The server reported the job as failed.
    Failed(String),
    /// The controller was unmounted before a terminal outcome.
    Unmounted,
}

/// Owns the collaborators of one loading view.
///
/// [`LoadingController::mount`] consumes the controller, so a controller
/// instance can create at most one job.
pub struct LoadingController {
    api: Arc<dyn JobApi>,
    identity: Arc<dyn IdentitySource>,
    navigator: Arc<dyn Navigator>,
    polling: PollingConfig,
}

impl LoadingController {
    pub fn new(
        api: Arc<dyn JobApi>,
        identity: Arc<dyn IdentitySource>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            identity,
            navigator,
            polling: PollingConfig::default(),
        }
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Run the identity guard and, if it passes, spawn the session task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(self) -> ControllerHandle {
        let link = Arc::new(SessionLink::new());

        let Some(identity) = identity::guard(&*self.identity, &*self.navigator) else {
            return ControllerHandle {
                link,
                task: SessionTask::Done(SessionOutcome::Unauthorized),
            };
        };

        let task = tokio::spawn(run_session(self, identity, link.clone()));
        ControllerHandle {
            link,
            task: SessionTask::Running(task),
        }
    }
}

enum SessionTask {
    Running(JoinHandle<SessionOutcome>),
    Done(SessionOutcome),
}

/// Handle to a mounted controller. Dropping it unmounts.
pub struct ControllerHandle {
    link: Arc<SessionLink>,
    task: SessionTask,
}

impl ControllerHandle {
    /// Receive a [`ControllerView`] after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ControllerView> {
        self.link.subscribe()
    }

    pub fn view(&self) -> ControllerView {
        self.link.current()
    }

    /// Cancel the poll timer and any pending handoff. In-flight queries
    /// resolve into nothing.
    pub fn unmount(&self) {
        if self.link.is_alive() {
            info!("unmounting loading controller");
        }
        self.link.close();
    }

    pub fn is_mounted(&self) -> bool {
        self.link.is_alive()
    }

    /// Wait for the session to end. Safe to call again after it resolved.
    pub async fn finished(&mut self) -> SessionOutcome {
        let outcome = match &mut self.task {
            SessionTask::Done(outcome) => return outcome.clone(),
            SessionTask::Running(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "loading session task aborted");
                    SessionOutcome::Unmounted
                }
            },
        };
        self.task = SessionTask::Done(outcome.clone());
        outcome
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.link.close();
    }
}

// ── Session task ─────────────────────────────────────────────────────

async fn run_session(
    controller: LoadingController,
    identity: String,
    link: Arc<SessionLink>,
) -> SessionOutcome {
    let LoadingController {
        api,
        navigator,
        polling,
        ..
    } = controller;

    let initiator = JobInitiator::new(api.clone());
    let mut tracker = StatusTracker::new();
    link.publish(tracker.view());

    let attempt = tokio::select! {
        biased;
        _ = link.cancelled() => return SessionOutcome::Unmounted,
        attempt = initiator.start(&identity) => attempt,
    };
    if !link.is_alive() {
        return SessionOutcome::Unmounted;
    }

    let job_id = match attempt {
        StartAttempt::Created(ticket) => {
            tracker.adopt(&ticket);
            link.publish(tracker.view());
            ticket.job_id
        }
        StartAttempt::Failed(_) => {
            tracker.fail_initiation(INITIATION_FAILED_MESSAGE);
            link.publish(tracker.view());
            return SessionOutcome::InitiationFailed(INITIATION_FAILED_MESSAGE.to_string());
        }
        StartAttempt::AlreadyStarted => {
            // The initiator is private to this task; nothing else can start it.
            warn!("job creation latch already set, abandoning session");
            return SessionOutcome::Unmounted;
        }
    };

    let exit = match tracker.status() {
        JobStatus::Ready => PollExit::Ready,
        JobStatus::Failed => PollExit::Failed(
            tracker.error().unwrap_or(DEFAULT_FAILURE_MESSAGE).to_string(),
        ),
        JobStatus::Pending | JobStatus::Processing => {
            PollScheduler::new(api, polling.interval())
                .run(&job_id, &mut tracker, &link)
                .await
        }
    };

    let mut driver = TransitionDriver::new(navigator, polling.ready_grace());
    match exit {
        PollExit::Ready => {
            if driver.hand_off(&link).await {
                SessionOutcome::Ready
            } else {
                SessionOutcome::Unmounted
            }
        }
        PollExit::Failed(message) => {
            driver.halt(&message);
            SessionOutcome::Failed(message)
        }
        PollExit::Cancelled => SessionOutcome::Unmounted,
    }
}
