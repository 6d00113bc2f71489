//! Pipeline error types.

use thiserror::Error;

use courtcam_models::{FailureKind, JobId};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Analysis failed: {0}")]
    AnalyzeFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Job {0} is still in flight")]
    Busy(JobId),

    #[error("Job cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn analyze_failed(msg: impl Into<String>) -> Self {
        Self::AnalyzeFailed(msg.into())
    }

    pub fn fetch_failed(msg: impl Into<String>) -> Self {
        Self::FetchFailed(msg.into())
    }

    /// Build the error for a phase failure kind.
    pub fn for_kind(kind: FailureKind, msg: impl Into<String>) -> Self {
        match kind {
            FailureKind::InvalidInput => Self::InvalidInput(msg.into()),
            FailureKind::UploadFailed => Self::UploadFailed(msg.into()),
            FailureKind::AnalyzeFailed => Self::AnalyzeFailed(msg.into()),
            FailureKind::FetchFailed => Self::FetchFailed(msg.into()),
            FailureKind::Busy => Self::Busy(JobId::from_string(msg.into())),
            FailureKind::Cancelled => Self::Cancelled,
        }
    }

    /// The failure kind recorded on the job.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::InvalidInput(_) => FailureKind::InvalidInput,
            PipelineError::UploadFailed(_) => FailureKind::UploadFailed,
            PipelineError::AnalyzeFailed(_) => FailureKind::AnalyzeFailed,
            PipelineError::FetchFailed(_) => FailureKind::FetchFailed,
            PipelineError::Busy(_) => FailureKind::Busy,
            PipelineError::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
