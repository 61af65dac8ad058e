use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::ApiError;

/// Opaque identifier of a server-side ingestion job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, as shown next to the progress bar.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-reported job state. `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Ready,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts any JSON number and clamps it into `0..=100`.
fn deserialize_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_progress(raw))
}

pub fn clamp_progress(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}

// ── Wire payloads ─────────────────────────────────────────────

/// Body of the job creation endpoint, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
}

/// A freshly created job: the Job Initiator's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
}

impl TryFrom<CreateJobResponse> for JobTicket {
    type Error = ApiError;

    fn try_from(resp: CreateJobResponse) -> Result<Self, Self::Error> {
        let job_id = resp
            .job_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Malformed("missing job_id".into()))?;
        Ok(Self {
            job_id: JobId::new(job_id),
            status: resp.status,
            progress: resp.progress,
        })
    }
}

/// Body of the job status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Phase ─────────────────────────────────────────────────────

/// Human-facing phase derived from status and progress.
///
/// Status always wins over progress: a `READY` report with progress 0 is
/// still `Phase::Ready`. Progress only picks the phase while the job is
/// non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No job exists yet.
    Initializing,
    Queuing,
    ReadingDocuments,
    Embedding,
    SavingVectors,
    Finalizing,
    Ready,
    Failed,
}

impl Phase {
    pub fn interpret(status: JobStatus, progress: u8) -> Self {
        match status {
            JobStatus::Ready => Self::Ready,
            JobStatus::Failed => Self::Failed,
            JobStatus::Pending | JobStatus::Processing => match progress {
                0..=9 => Self::Queuing,
                10..=29 => Self::ReadingDocuments,
                30..=59 => Self::Embedding,
                60..=89 => Self::SavingVectors,
                _ => Self::Finalizing,
            },
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Initializing => "Initializing connection",
            Self::Queuing => "Queuing job",
            Self::ReadingDocuments => "Reading documents",
            Self::Embedding => "Chunking and embedding text",
            Self::SavingVectors => "Saving to vector store",
            Self::Finalizing => "Finalizing setup",
            Self::Ready => "System ready",
            Self::Failed => "Initialization failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
