//! Detection debouncer.
//!
//! A flip of the detection signal is only believed once it has held for the
//! settle delay. The debouncer itself owns no timer: every step tells the
//! driver what to do with the single settle timer (arm, cancel, keep), and
//! the driver reports back through [`DetectionDebouncer::settle`] when the
//! timer fires. Each armed timer carries a generation so a fire that raced
//! with a cancel is recognised and ignored.

use std::time::{Duration, Instant};

use courtcam_models::{DetectionSample, RecordingDecision};

/// A settle timer the driver has been asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTimer {
    pub generation: u64,
    /// Signal value that will be adopted when the timer fires
    pub signal: bool,
    pub armed_at: Instant,
}

/// What the driver must do with its settle timer after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Leave any running timer alone
    Keep,
    /// Replace any running timer with this one
    Arm(SettleTimer),
    /// Stop the running timer
    Cancel,
}

/// Result of feeding one input to the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub decision: RecordingDecision,
    pub timer: TimerCommand,
}

impl Step {
    fn noop(timer: TimerCommand) -> Self {
        Self {
            decision: RecordingDecision::NoOp,
            timer,
        }
    }
}

/// Point-in-time view of the debouncer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncerSnapshot {
    pub last_stable: bool,
    pub pending: Option<bool>,
    pub is_recording: bool,
    pub auto_record: bool,
}

#[derive(Debug)]
pub struct DetectionDebouncer {
    settle_delay: Duration,
    last_stable: bool,
    pending: Option<SettleTimer>,
    is_recording: bool,
    auto_record: bool,
    next_generation: u64,
}

impl DetectionDebouncer {
    /// Fresh debouncer: no court seen, not recording, auto-record on.
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            last_stable: false,
            pending: None,
            is_recording: false,
            auto_record: true,
            next_generation: 0,
        }
    }

    pub fn with_auto_record(mut self, enabled: bool) -> Self {
        self.auto_record = enabled;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn auto_record(&self) -> bool {
        self.auto_record
    }

    pub fn last_stable(&self) -> bool {
        self.last_stable
    }

    pub fn pending(&self) -> Option<SettleTimer> {
        self.pending
    }

    /// When the pending flip will be adopted, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|timer| timer.armed_at + self.settle_delay)
    }

    pub fn snapshot(&self) -> DebouncerSnapshot {
        DebouncerSnapshot {
            last_stable: self.last_stable,
            pending: self.pending.map(|timer| timer.signal),
            is_recording: self.is_recording,
            auto_record: self.auto_record,
        }
    }

    /// Feed one detection sample.
    ///
    /// Never produces a start/stop directly; a flip only arms the settle
    /// timer. Repeating the pending value does not restart the clock.
    pub fn observe(&mut self, sample: &DetectionSample) -> Step {
        if !self.auto_record {
            return Step::noop(self.clear_pending());
        }

        let value = sample.is_court();
        if value == self.last_stable {
            // Flicker back to the stable value
            return Step::noop(self.clear_pending());
        }

        if let Some(pending) = self.pending {
            if pending.signal == value {
                return Step::noop(TimerCommand::Keep);
            }
        }

        let timer = SettleTimer {
            generation: self.bump_generation(),
            signal: value,
            armed_at: sample.observed_at(),
        };
        self.pending = Some(timer);
        Step::noop(TimerCommand::Arm(timer))
    }

    /// The settle timer of `generation` fired.
    ///
    /// Stale generations are ignored. Otherwise the pending signal becomes
    /// stable and recording follows it.
    pub fn settle(&mut self, generation: u64) -> RecordingDecision {
        let timer = match self.pending {
            Some(timer) if timer.generation == generation => timer,
            _ => return RecordingDecision::NoOp,
        };
        self.pending = None;
        self.last_stable = timer.signal;

        match (timer.signal, self.is_recording) {
            (true, false) => {
                self.is_recording = true;
                RecordingDecision::StartRecording
            }
            (false, true) => {
                self.is_recording = false;
                RecordingDecision::StopRecording
            }
            _ => RecordingDecision::NoOp,
        }
    }

    /// Toggle auto-record. Any pending flip is dropped; nothing is emitted.
    pub fn set_auto_record(&mut self, enabled: bool) -> Step {
        self.auto_record = enabled;
        Step::noop(self.clear_pending())
    }

    /// User pressed record. Takes effect immediately and drops any pending
    /// flip.
    pub fn manual_start(&mut self) -> Step {
        let timer = self.clear_pending();
        if self.is_recording {
            return Step::noop(timer);
        }
        self.is_recording = true;
        Step {
            decision: RecordingDecision::StartRecording,
            timer,
        }
    }

    /// User pressed stop. Takes effect immediately and drops any pending
    /// flip.
    pub fn manual_stop(&mut self) -> Step {
        let timer = self.clear_pending();
        if !self.is_recording {
            return Step::noop(timer);
        }
        self.is_recording = false;
        Step {
            decision: RecordingDecision::StopRecording,
            timer,
        }
    }

    fn clear_pending(&mut self) -> TimerCommand {
        match self.pending.take() {
            Some(_) => TimerCommand::Cancel,
            None => TimerCommand::Keep,
        }
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}
