//! Fixed-rate status polling.
//!
//! The timer fires every `interval`, measured from activation rather than
//! from the previous response. At most one status query is in flight: a tick
//! that finds the previous query unresolved is skipped. Transient failures
//! are logged and retried on the next tick without a ceiling.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use ragreader_core::{ApiError, JobId, JobStatus, JobStatusReport};

use crate::api::JobApi;
use crate::session::SessionLink;
use crate::tracker::{ApplyOutcome, QuerySeq, StatusTracker, DEFAULT_FAILURE_MESSAGE};

type StatusQuery = BoxFuture<'static, (QuerySeq, Result<JobStatusReport, ApiError>)>;

/// Why the scheduler stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollExit {
    Ready,
    Failed(String),
    /// The session was torn down.
    Cancelled,
}

pub struct PollScheduler {
    api: Arc<dyn JobApi>,
    interval: Duration,
}

impl PollScheduler {
    pub fn new(api: Arc<dyn JobApi>, interval: Duration) -> Self {
        Self { api, interval }
    }

    /// Poll `job_id` until it turns terminal or the session closes.
    ///
    /// The timer lives only inside this call, so returning cancels it.
    pub async fn run(
        &self,
        job_id: &JobId,
        tracker: &mut StatusTracker,
        link: &SessionLink,
    ) -> PollExit {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<StatusQuery> = None;

        info!(
            job_id = %job_id,
            interval_ms = self.interval.as_millis() as u64,
            "status polling started"
        );

        loop {
            if !link.is_alive() {
                return PollExit::Cancelled;
            }

            tokio::select! {
                biased;

                _ = link.cancelled() => {
                    info!(job_id = %job_id, "status polling cancelled");
                    return PollExit::Cancelled;
                }

                Some((seq, result)) = next_response(&mut in_flight), if in_flight.is_some() => {
                    if !link.is_alive() {
                        debug!(job_id = %job_id, seq = seq.value(), "session closed, dropping status response");
                        return PollExit::Cancelled;
                    }
                    if let Some(exit) = self.handle_response(job_id, seq, result, tracker, link) {
                        info!(job_id = %job_id, exit = ?exit, "status polling stopped");
                        return exit;
                    }
                }

                _ = ticker.tick() => {
                    if in_flight.is_some() {
                        debug!(job_id = %job_id, "previous status query unresolved, skipping tick");
                        continue;
                    }
                    let seq = tracker.issue();
                    debug!(job_id = %job_id, seq = seq.value(), "querying job status");
                    let api = self.api.clone();
                    let id = job_id.clone();
                    in_flight = Some(Box::pin(async move { (seq, api.job_status(&id).await) }));
                }
            }
        }
    }

    fn handle_response(
        &self,
        job_id: &JobId,
        seq: QuerySeq,
        result: Result<JobStatusReport, ApiError>,
        tracker: &mut StatusTracker,
        link: &SessionLink,
    ) -> Option<PollExit> {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    seq = seq.value(),
                    error = %e,
                    "status query failed, retrying on next tick"
                );
                return None;
            }
        };

        match tracker.apply(seq, report) {
            ApplyOutcome::Updated => {}
            outcome => {
                debug!(job_id = %job_id, seq = seq.value(), ?outcome, "status response discarded");
                return None;
            }
        }

        debug!(
            job_id = %job_id,
            seq = seq.value(),
            status = %tracker.status(),
            progress = tracker.progress(),
            "job status applied"
        );
        link.publish(tracker.view());

        match tracker.status() {
            JobStatus::Ready => Some(PollExit::Ready),
            JobStatus::Failed => Some(PollExit::Failed(
                tracker.error().unwrap_or(DEFAULT_FAILURE_MESSAGE).to_string(),
            )),
            JobStatus::Pending | JobStatus::Processing => None,
        }
    }
}

/// Drive the in-flight query, clearing the slot once it resolves.
///
/// Dropping this future leaves the query in the slot, so a tick winning the
/// race does not lose the response.
async fn next_response(
    slot: &mut Option<StatusQuery>,
) -> Option<(QuerySeq, Result<JobStatusReport, ApiError>)> {
    let query = slot.as_mut()?;
    let response = query.await;
    *slot = None;
    Some(response)
}
