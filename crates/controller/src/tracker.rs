//! Job state machine with issue-order staleness checks.
//!
//! Every status query gets a [`QuerySeq`] when it is issued. A response is
//! applied only if no later-issued query has already been applied, and only
//! while the job is non-terminal. Once `READY` or `FAILED` is applied the
//! tracker is frozen.

use serde::Serialize;
use tracing::debug;

use ragreader_core::{JobId, JobStatus, JobStatusReport, JobTicket, Phase};

/// Error text used when the server reports `FAILED` without a message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "An unknown error occurred.";

/// Issue-order tag of a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuerySeq(u64);

impl QuerySeq {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What [`StatusTracker::apply`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Updated,
    /// A later-issued response was already applied.
    Stale,
    /// The job had already reached a terminal state.
    AfterTerminal,
}

/// Snapshot published to renderers after every accepted change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerView {
    pub job_id: Option<JobId>,
    pub status: JobStatus,
    pub progress: u8,
    pub phase: Phase,
    /// Server-reported failure, set only when `status` is `FAILED`.
    pub error: Option<String>,
    /// Local failure to create the job.
    pub init_error: Option<String>,
}

impl Default for ControllerView {
    fn default() -> Self {
        Self {
            job_id: None,
            status: JobStatus::Pending,
            progress: 0,
            phase: Phase::Initializing,
            error: None,
            init_error: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct StatusTracker {
    job_id: Option<JobId>,
    status: JobStatus,
    progress: u8,
    error: Option<String>,
    init_error: Option<String>,
    next_seq: u64,
    last_applied: Option<QuerySeq>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the job identity and initial state from the creation response.
    ///
    /// The job id is write-once; a second ticket is ignored.
    pub fn adopt(&mut self, ticket: &JobTicket) -> bool {
        if self.job_id.is_some() {
            debug!(job_id = %ticket.job_id, "job already adopted, ignoring ticket");
            return false;
        }
        self.job_id = Some(ticket.job_id.clone());
        self.status = ticket.status;
        self.progress = ticket.progress;
        if ticket.status == JobStatus::Failed {
            self.error = Some(DEFAULT_FAILURE_MESSAGE.to_string());
        }
        true
    }

    pub fn fail_initiation(&mut self, message: impl Into<String>) {
        self.init_error = Some(message.into());
    }

    /// Tag a new status query.
    pub fn issue(&mut self) -> QuerySeq {
        self.next_seq += 1;
        QuerySeq(self.next_seq)
    }

    pub fn apply(&mut self, seq: QuerySeq, report: JobStatusReport) -> ApplyOutcome {
        if self.status.is_terminal() {
            return ApplyOutcome::AfterTerminal;
        }
        if self.last_applied.is_some_and(|last| seq < last) {
            return ApplyOutcome::Stale;
        }

        self.last_applied = Some(seq);
        self.status = report.status;
        self.progress = report.progress;
        self.error = match report.status {
            JobStatus::Failed => Some(
                report
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            ),
            _ => None,
        };
        ApplyOutcome::Updated
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn phase(&self) -> Phase {
        if self.job_id.is_none() {
            return Phase::Initializing;
        }
        Phase::interpret(self.status, self.progress)
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            job_id: self.job_id.clone(),
            status: self.status,
            progress: self.progress,
            phase: self.phase(),
            error: self.error.clone(),
            init_error: self.init_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: JobStatus, progress: u8) -> JobStatusReport {
        JobStatusReport {
            status,
            progress,
            error: None,
        }
    }

    fn adopted() -> StatusTracker {
        let mut tracker = StatusTracker::new();
        tracker.adopt(&JobTicket {
            job_id: JobId::new("job-7"),
            status: JobStatus::Pending,
            progress: 0,
        });
        tracker
    }

    #[test]
    fn test_initial_view() {
        let tracker = StatusTracker::new();
        let view = tracker.view();
        assert_eq!(view.phase, Phase::Initializing);
        assert!(view.job_id.is_none());
        assert_eq!(view, ControllerView::default());
    }

    #[test]
    fn test_adopt_is_write_once() {
        let mut tracker = adopted();
        let second = JobTicket {
            job_id: JobId::new("job-8"),
            status: JobStatus::Processing,
            progress: 50,
        };
        assert!(!tracker.adopt(&second));
        assert_eq!(tracker.job_id().unwrap().as_str(), "job-7");
        assert_eq!(tracker.status(), JobStatus::Pending);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut tracker = adopted();
        let a = tracker.issue();
        let b = tracker.issue();
        assert!(b > a);
        assert_eq!(b.value(), a.value() + 1);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut tracker = adopted();
        let a = tracker.issue();
        let b = tracker.issue();

        assert_eq!(tracker.apply(b, report(JobStatus::Processing, 40)), ApplyOutcome::Updated);
        assert_eq!(tracker.apply(a, report(JobStatus::Processing, 20)), ApplyOutcome::Stale);
        assert_eq!(tracker.progress(), 40);
    }

    #[test]
    fn test_stale_response_after_ready_keeps_ready() {
        let mut tracker = adopted();
        let a = tracker.issue();
        let b = tracker.issue();

        tracker.apply(b, report(JobStatus::Ready, 100));
        let outcome = tracker.apply(a, report(JobStatus::Processing, 20));

        assert_ne!(outcome, ApplyOutcome::Updated);
        assert_eq!(tracker.status(), JobStatus::Ready);
        assert_eq!(tracker.progress(), 100);
        assert_eq!(tracker.phase(), Phase::Ready);
    }

    #[test]
    fn test_terminal_state_absorbs() {
        let mut tracker = adopted();
        let a = tracker.issue();
        tracker.apply(a, report(JobStatus::Failed, 30));
        let b = tracker.issue();
        assert_eq!(
            tracker.apply(b, report(JobStatus::Ready, 100)),
            ApplyOutcome::AfterTerminal
        );
        assert_eq!(tracker.status(), JobStatus::Failed);
    }

    #[test]
    fn test_failed_uses_server_message_or_default() {
        let mut tracker = adopted();
        let seq = tracker.issue();
        tracker.apply(
            seq,
            JobStatusReport {
                status: JobStatus::Failed,
                progress: 10,
                error: Some("vector store unreachable".to_string()),
            },
        );
        assert_eq!(tracker.error(), Some("vector store unreachable"));
        assert_eq!(tracker.phase().message(), "Initialization failed");

        let mut tracker = adopted();
        let seq = tracker.issue();
        tracker.apply(seq, report(JobStatus::Failed, 10));
        assert_eq!(tracker.error(), Some(DEFAULT_FAILURE_MESSAGE));
    }

    #[test]
    fn test_ready_with_low_progress_is_success() {
        let mut tracker = adopted();
        let seq = tracker.issue();
        tracker.apply(seq, report(JobStatus::Ready, 0));
        assert!(tracker.is_terminal());
        assert_eq!(tracker.view().phase.message(), "System ready");
    }

    #[test]
    fn test_non_terminal_clears_error() {
        let mut tracker = adopted();
        let seq = tracker.issue();
        tracker.apply(
            seq,
            JobStatusReport {
                status: JobStatus::Processing,
                progress: 65,
                error: Some("ignored".to_string()),
            },
        );
        assert!(tracker.error().is_none());
        assert_eq!(tracker.phase(), Phase::SavingVectors);
    }
}
