//! One-shot creation of the ingestion job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use ragreader_core::{ApiError, JobTicket};

use crate::api::JobApi;

/// Message recorded when the job cannot be created.
pub const INITIATION_FAILED_MESSAGE: &str = "Could not start the ingestion job.";

/// Result of asking the initiator to create a job.
#[derive(Debug)]
pub enum StartAttempt {
    Created(JobTicket),
    Failed(ApiError),
    /// The latch was already set; no request was sent.
    AlreadyStarted,
}

/// Issues the job creation request at most once.
///
/// The latch is flipped before the request future is awaited, so two
/// activations racing on the same initiator cannot both observe
/// "not started".
pub struct JobInitiator {
    api: Arc<dyn JobApi>,
    started: AtomicBool,
}

impl JobInitiator {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self {
            api,
            started: AtomicBool::new(false),
        }
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Create the job for `identity`. Never retries.
    pub async fn start(&self, identity: &str) -> StartAttempt {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("job creation already dispatched, ignoring activation");
            return StartAttempt::AlreadyStarted;
        }

        info!(identity = %identity, "creating ingestion job");
        match self.api.create_job(identity).await {
            Ok(ticket) => {
                info!(
                    job_id = %ticket.job_id,
                    status = %ticket.status,
                    progress = ticket.progress,
                    "ingestion job created"
                );
                StartAttempt::Created(ticket)
            }
            Err(e) => {
                error!(identity = %identity, error = %e, "failed to create ingestion job");
                StartAttempt::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragreader_core::{JobId, JobStatus, JobStatusReport};
    use std::sync::atomic::AtomicUsize;

    struct MockApi {
        create_calls: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait]
    impl JobApi for MockApi {
        async fn create_job(&self, _identity: &str) -> Result<JobTicket, ApiError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.should_fail {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            Ok(JobTicket {
                job_id: JobId::new("job-1"),
                status: JobStatus::Pending,
                progress: 0,
            })
        }

        async fn job_status(&self, _job_id: &JobId) -> Result<JobStatusReport, ApiError> {
            unreachable!("initiator never polls")
        }
    }

    fn initiator(should_fail: bool) -> (JobInitiator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let api = MockApi {
            create_calls: calls.clone(),
            should_fail,
        };
        (JobInitiator::new(Arc::new(api)), calls)
    }

    #[tokio::test]
    async fn creates_job_once() {
        let (initiator, calls) = initiator(false);
        assert!(!initiator.has_started());

        let first = initiator.start("alice").await;
        assert!(matches!(first, StartAttempt::Created(ref t) if t.job_id.as_str() == "job-1"));

        let second = initiator.start("alice").await;
        assert!(matches!(second, StartAttempt::AlreadyStarted));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_activations_send_one_request() {
        let (initiator, calls) = initiator(false);

        let (a, b, c) = tokio::join!(
            initiator.start("alice"),
            initiator.start("alice"),
            initiator.start("alice"),
        );

        let created = [&a, &b, &c]
            .iter()
            .filter(|r| matches!(r, StartAttempt::Created(_)))
            .count();
        assert_eq!(created, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_not_retried() {
        let (initiator, calls) = initiator(true);

        assert!(matches!(initiator.start("alice").await, StartAttempt::Failed(_)));
        assert!(matches!(
            initiator.start("alice").await,
            StartAttempt::AlreadyStarted
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
