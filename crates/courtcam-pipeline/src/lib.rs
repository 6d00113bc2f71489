//! Remote analysis pipeline.
//!
//! This crate provides:
//! - The upload -> analyze -> fetch orchestrator, one job at a time
//! - Job handles with non-blocking progress and terminal outcomes
//! - Cosmetic elapsed-time estimation while the server analyzes
//! - Completion notification and job metrics

pub mod config;
pub mod error;
pub mod handle;
pub mod logging;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod service;

pub use config::{PipelineConfig, SubmitPolicy};
pub use error::{PipelineError, PipelineResult};
pub use handle::{JobHandle, JobOutcome};
pub use logging::JobLogger;
pub use notifier::{JobNotifier, LogNotifier};
pub use pipeline::UploadAnalyzePipeline;
pub use service::AnalysisService;
