//! Analysis job definitions.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::archive::{is_delimiter_safe, ArchiveEntry};
use crate::error::{ModelError, ModelResult};
use crate::strokes::StrokeCounts;

/// Unique identifier for an analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created, no request issued yet
    #[default]
    Idle,
    /// Sending the source video
    Uploading,
    /// Waiting on the remote analysis
    Analyzing,
    /// Downloading the processed video
    Fetching,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Uploading => "uploading",
            JobState::Analyzing => "analyzing",
            JobState::Fetching => "fetching",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a job ended in [`JobState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    UploadFailed,
    AnalyzeFailed,
    FetchFailed,
    Busy,
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::UploadFailed => "upload_failed",
            FailureKind::AnalyzeFailed => "analyze_failed",
            FailureKind::FetchFailed => "fetch_failed",
            FailureKind::Busy => "busy",
            FailureKind::Cancelled => "cancelled",
        }
    }

    /// Message shown to the end user. Same for every kind.
    pub fn user_message(&self) -> &'static str {
        "Analysis failed. Try again."
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Successful outcome of an analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub job_id: JobId,
    /// Key of the uploaded source video
    pub remote_key: String,
    /// Key of the processed video on the analysis service
    pub video_key: String,
    /// Local copy of the processed video
    pub result_file: PathBuf,
    pub stroke_counts: StrokeCounts,
    /// Server-side processing time, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
}

impl AnalysisResult {
    /// Archive entry for this result, notes set to the stroke summary.
    pub fn archive_entry(&self, name: impl Into<String>) -> ArchiveEntry {
        ArchiveEntry::new(name, self.video_key.clone(), self.stroke_counts.summary())
    }

    /// Archive entry named after the current local time.
    pub fn archive_entry_now(&self) -> ArchiveEntry {
        self.archive_entry(Local::now().format("%m/%d/%Y %H:%M:%S").to_string())
    }
}

/// Terminal job notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Succeeded { result: AnalysisResult },
    Failed { job_id: JobId, kind: FailureKind },
}

impl JobEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobEvent::Succeeded { result } => &result.job_id,
            JobEvent::Failed { job_id, .. } => job_id,
        }
    }
}

/// Point-in-time view of a job, safe to hand to any thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: JobId,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration_seconds: Option<f64>,
}

impl JobProgress {
    /// Elapsed over estimate, clamped to `[0, 1]`.
    ///
    /// The elapsed counter is cosmetic and routinely overshoots the
    /// estimate, so this never reports more than 1.
    pub fn fraction(&self) -> f64 {
        match self.estimated_duration_seconds {
            Some(estimate) if estimate > 0.0 => (self.elapsed_seconds / estimate).clamp(0.0, 1.0),
            // A zero estimate is already overrun as soon as any time passes
            Some(_) if self.elapsed_seconds > 0.0 => 1.0,
            _ => 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// One client-initiated analysis request and everything learned about it.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    id: JobId,
    source_file: PathBuf,
    remote_key: Option<String>,
    estimated_duration: Option<f64>,
    elapsed: Duration,
    stroke_counts: Option<StrokeCounts>,
    result_file: Option<PathBuf>,
    state: JobState,
    failure: Option<FailureKind>,
}

impl AnalysisJob {
    pub fn new(id: JobId, source_file: impl Into<PathBuf>) -> Self {
        Self {
            id,
            source_file: source_file.into(),
            remote_key: None,
            estimated_duration: None,
            elapsed: Duration::ZERO,
            stroke_counts: None,
            result_file: None,
            state: JobState::Idle,
            failure: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn remote_key(&self) -> Option<&str> {
        self.remote_key.as_deref()
    }

    pub fn estimated_duration_seconds(&self) -> Option<f64> {
        self.estimated_duration
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn stroke_counts(&self) -> Option<&StrokeCounts> {
        self.stroke_counts.as_ref()
    }

    pub fn result_file(&self) -> Option<&Path> {
        self.result_file.as_deref()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn progress(&self) -> JobProgress {
        JobProgress {
            job_id: self.id.clone(),
            state: self.state,
            failure: self.failure,
            elapsed_seconds: self.elapsed_seconds(),
            estimated_duration_seconds: self.estimated_duration,
        }
    }

    /// `Idle -> Uploading`.
    pub fn begin_upload(&mut self) -> ModelResult<()> {
        self.transition(JobState::Idle, JobState::Uploading)
    }

    /// `Uploading -> Analyzing`, recording the remote key and estimate first.
    pub fn record_upload(&mut self, remote_key: impl Into<String>, estimated_seconds: f64) -> ModelResult<()> {
        let remote_key = remote_key.into();
        self.check(JobState::Uploading, JobState::Analyzing)?;
        if !is_delimiter_safe(&remote_key) {
            return Err(ModelError::InvalidRemoteKey(remote_key));
        }

        self.remote_key = Some(remote_key);
        // NaN and negative estimates collapse to zero
        self.estimated_duration = Some(estimated_seconds.max(0.0));
        self.state = JobState::Analyzing;
        Ok(())
    }

    /// Advance the cosmetic elapsed counter. Only counts while analyzing.
    pub fn tick(&mut self, period: Duration) -> bool {
        if self.state != JobState::Analyzing {
            return false;
        }
        self.elapsed += period;
        true
    }

    /// `Analyzing -> Fetching`.
    pub fn begin_fetch(&mut self) -> ModelResult<()> {
        self.transition(JobState::Analyzing, JobState::Fetching)
    }

    /// `Fetching -> Succeeded`, setting the result file and stroke counts together.
    pub fn succeed(&mut self, result_file: impl Into<PathBuf>, stroke_counts: StrokeCounts) -> ModelResult<()> {
        self.check(JobState::Fetching, JobState::Succeeded)?;
        self.result_file = Some(result_file.into());
        self.stroke_counts = Some(stroke_counts);
        self.state = JobState::Succeeded;
        Ok(())
    }

    /// Any non-terminal state to `Failed`.
    pub fn fail(&mut self, kind: FailureKind) -> ModelResult<()> {
        if self.state.is_terminal() {
            return Err(ModelError::AlreadyTerminal(self.state));
        }
        self.state = JobState::Failed;
        self.failure = Some(kind);
        Ok(())
    }

    fn check(&self, from: JobState, to: JobState) -> ModelResult<()> {
        if self.state.is_terminal() {
            return Err(ModelError::AlreadyTerminal(self.state));
        }
        if self.state != from {
            return Err(ModelError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }

    fn transition(&mut self, from: JobState, to: JobState) -> ModelResult<()> {
        self.check(from, to)?;
        self.state = to;
        Ok(())
    }
}
