//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// What `submit` does while another job is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPolicy {
    /// Cancel the running job and start the new one
    #[default]
    Supersede,
    /// Refuse the new job with `Busy`
    Reject,
}

impl FromStr for SubmitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supersede" => Ok(SubmitPolicy::Supersede),
            "reject" => Ok(SubmitPolicy::Reject),
            other => Err(format!("unknown submit policy '{}'", other)),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory receiving fetched result videos
    pub work_dir: PathBuf,
    /// Period of the cosmetic elapsed-time tick
    pub tick_interval: Duration,
    pub submit_policy: SubmitPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("courtcam"),
            tick_interval: Duration::from_millis(100),
            submit_policy: SubmitPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("COURTCAM_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            tick_interval: Duration::from_millis(
                std::env::var("COURTCAM_TICK_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|ms| *ms > 0)
                    .unwrap_or(100),
            ),
            submit_policy: std::env::var("COURTCAM_SUBMIT_POLICY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Default config writing results into `work_dir`.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Default::default()
        }
    }
}
