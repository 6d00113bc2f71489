//! Court detection samples and the recording decisions derived from them.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One "is a court in frame" observation from the frame classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSample {
    is_court: bool,
    observed_at: Instant,
}

impl DetectionSample {
    pub fn new(is_court: bool, observed_at: Instant) -> Self {
        Self {
            is_court,
            observed_at,
        }
    }

    /// Sample stamped with the current time.
    pub fn now(is_court: bool) -> Self {
        Self::new(is_court, Instant::now())
    }

    pub fn is_court(&self) -> bool {
        self.is_court
    }

    pub fn observed_at(&self) -> Instant {
        self.observed_at
    }
}

/// Output of the auto-record engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordingDecision {
    #[default]
    NoOp,
    StartRecording,
    StopRecording,
}

impl RecordingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingDecision::NoOp => "no_op",
            RecordingDecision::StartRecording => "start_recording",
            RecordingDecision::StopRecording => "stop_recording",
        }
    }

    /// True for decisions the recording interface has to act on.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, RecordingDecision::NoOp)
    }
}

impl fmt::Display for RecordingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
