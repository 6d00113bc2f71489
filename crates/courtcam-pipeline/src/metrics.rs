//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the embedding application picks
//! the exporter. Without an installed recorder these calls are no-ops.

use metrics::{counter, histogram};

use courtcam_models::FailureKind;

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "courtcam_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "courtcam_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "courtcam_jobs_failed_total";
    pub const PHASE_DURATION_SECONDS: &str = "courtcam_phase_duration_seconds";
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

pub fn record_job_completed() {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
}

pub fn record_job_failed(kind: FailureKind) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record how long one network phase took.
pub fn record_phase_duration(phase: &str, duration_secs: f64) {
    let labels = [("phase", phase.to_string())];
    histogram!(names::PHASE_DURATION_SECONDS, &labels).record(duration_secs);
}
