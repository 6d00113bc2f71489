//! Recorder configuration.

use std::time::Duration;

/// Auto-record configuration.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// How long a flipped detection must hold before it is believed
    pub settle_delay: Duration,
    /// Classify every Nth camera frame
    pub frame_stride: u32,
    /// Whether auto-record starts enabled
    pub auto_record: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            frame_stride: 5,
            auto_record: true,
        }
    }
}

impl RecorderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            settle_delay: Duration::from_millis(
                std::env::var("COURTCAM_SETTLE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            frame_stride: std::env::var("COURTCAM_FRAME_STRIDE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|stride| *stride > 0)
                .unwrap_or(5),
            auto_record: std::env::var("COURTCAM_AUTO_RECORD")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }
}
