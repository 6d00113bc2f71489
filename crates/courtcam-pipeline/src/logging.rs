//! Structured job logging.
//!
//! Every line a job emits carries its ID, so a superseded job's late log
//! lines are easy to tell apart from the current one's. Phase timing goes
//! through here as well, which keeps the log line and the duration metric
//! in step.

use tokio::time::Instant;
use tracing::{error, info, warn, Span};

use courtcam_models::{AnalysisResult, FailureKind, JobId};

use crate::metrics;

/// Per-job logger.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.to_string(),
        }
    }

    pub fn log_submitted(&self, source: &str) {
        info!(job_id = %self.job_id, source, "Job submitted");
    }

    /// Log entry into a network phase and start its clock.
    pub fn begin_phase(&self, phase: &'static str, detail: &str) -> Instant {
        info!(job_id = %self.job_id, phase, "Phase started: {}", detail);
        Instant::now()
    }

    /// Log the end of a phase and record its duration. Returns seconds taken.
    pub fn finish_phase(&self, phase: &'static str, started: Instant) -> f64 {
        let secs = started.elapsed().as_secs_f64();
        info!(job_id = %self.job_id, phase, duration_secs = secs, "Phase finished");
        metrics::record_phase_duration(phase, secs);
        secs
    }

    pub fn log_succeeded(&self, result: &AnalysisResult) {
        info!(
            job_id = %self.job_id,
            strokes = result.stroke_counts.total(),
            result_file = %result.result_file.display(),
            "Job succeeded"
        );
    }

    pub fn log_failed(&self, kind: FailureKind, reason: &str) {
        error!(job_id = %self.job_id, kind = %kind, "Job failed: {}", reason);
    }

    /// The job was already cancelled or superseded when its outcome arrived.
    pub fn log_discarded(&self, reason: &str) {
        warn!(job_id = %self.job_id, "Discarding outcome of finished job: {}", reason);
    }

    /// Span wrapping the job's task.
    pub fn span(&self) -> Span {
        tracing::info_span!("analysis_job", job_id = %self.job_id)
    }
}
