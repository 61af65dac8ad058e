//! Job API trait consumed by the lifecycle controller.

use async_trait::async_trait;

use ragreader_core::{ApiError, JobId, JobStatusReport, JobTicket};

/// The two endpoints the controller needs: job creation and job status.
///
/// Implementations must not panic on network failures; every failure is an
/// [`ApiError`] that the controller turns into local state.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Start a background ingestion job for `identity`.
    async fn create_job(&self, identity: &str) -> Result<JobTicket, ApiError>;

    /// Fetch the current status of a job.
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusReport, ApiError>;
}
