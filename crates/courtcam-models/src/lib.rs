//! Shared data models for the CourtCam client core.
//!
//! This crate provides Serde-serializable types for:
//! - Analysis jobs, their lifecycle states and failure kinds
//! - Stroke statistics returned by the analysis service
//! - Court detection samples and recording decisions
//! - Archive log entries

pub mod archive;
pub mod detection;
pub mod error;
pub mod job;
pub mod strokes;

// Re-export common types
pub use archive::{is_delimiter_safe, ArchiveEntry, ARCHIVE_DELIMITER};
pub use detection::{DetectionSample, RecordingDecision};
pub use error::{ModelError, ModelResult};
pub use job::{AnalysisJob, AnalysisResult, FailureKind, JobEvent, JobId, JobProgress, JobState};
pub use strokes::{Side, StrokeCounts, StrokeType};
