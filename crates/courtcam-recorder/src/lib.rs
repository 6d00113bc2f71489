//! Auto-record engine.
//!
//! Turns a jittery stream of "is a court in frame" detections into stable
//! start/stop recording decisions:
//! - [`DetectionDebouncer`] is the synchronous state machine
//! - [`AutoRecorder`] drives it from a channel with real settle timers
//! - [`CourtFeed`] samples camera frames and asks a classifier about them

pub mod config;
pub mod debouncer;
pub mod error;
pub mod feed;
pub mod recorder;

pub use config::RecorderConfig;
pub use debouncer::{DebouncerSnapshot, DetectionDebouncer, SettleTimer, Step, TimerCommand};
pub use error::{RecorderError, RecorderResult};
pub use feed::{CourtClassifier, CourtFeed};
pub use recorder::{AutoRecorder, RecordingSink};
