//! Async driver for the detection debouncer.
//!
//! One task owns the debouncer and processes every input (samples, settle
//! fires, auto-record toggles, manual commands) in arrival order from a
//! channel. Settle timers are [`DelayedAction`]s that post back into the
//! same channel, so a timer fire is serialised with everything else.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use courtcam_models::{DetectionSample, RecordingDecision};
use courtcam_timer::DelayedAction;

use crate::config::RecorderConfig;
use crate::debouncer::{DebouncerSnapshot, DetectionDebouncer, Step, TimerCommand};
use crate::error::{RecorderError, RecorderResult};

const DECISIONS_TOTAL: &str = "courtcam_recording_decisions_total";

/// Receives start/stop decisions. Only actionable decisions are delivered.
pub trait RecordingSink: Send + Sync + 'static {
    fn apply(&self, decision: RecordingDecision);
}

impl RecordingSink for mpsc::UnboundedSender<RecordingDecision> {
    fn apply(&self, decision: RecordingDecision) {
        if self.send(decision).is_err() {
            debug!(%decision, "Recording sink dropped");
        }
    }
}

#[derive(Debug)]
enum Command {
    Sample(DetectionSample),
    Settled(u64),
    SetAutoRecord(bool),
    ManualStart,
    ManualStop,
    Snapshot(oneshot::Sender<DebouncerSnapshot>),
}

/// Handle to a running auto-recorder. Cheap to clone.
///
/// The driver task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct AutoRecorder {
    tx: mpsc::UnboundedSender<Command>,
}

impl AutoRecorder {
    /// Spawn the driver task. Must be called inside a tokio runtime.
    pub fn spawn(config: RecorderConfig, sink: impl RecordingSink) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer =
            DetectionDebouncer::new(config.settle_delay).with_auto_record(config.auto_record);
        let driver = Driver {
            debouncer,
            settle_timer: None,
            mailbox: tx.downgrade(),
            sink: Arc::new(sink),
        };
        tokio::spawn(driver.run(rx));
        Self { tx }
    }

    /// Feed a detection sample.
    pub fn observe(&self, sample: DetectionSample) -> RecorderResult<()> {
        self.send(Command::Sample(sample))
    }

    pub fn set_auto_record(&self, enabled: bool) -> RecorderResult<()> {
        self.send(Command::SetAutoRecord(enabled))
    }

    /// User-initiated start. Bypasses the debounce.
    pub fn start_manual(&self) -> RecorderResult<()> {
        self.send(Command::ManualStart)
    }

    /// User-initiated stop. Bypasses the debounce.
    pub fn stop_manual(&self) -> RecorderResult<()> {
        self.send(Command::ManualStop)
    }

    /// Debouncer state after every input sent so far has been processed.
    pub async fn snapshot(&self) -> RecorderResult<DebouncerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| RecorderError::Closed)
    }

    fn send(&self, command: Command) -> RecorderResult<()> {
        self.tx.send(command).map_err(|_| RecorderError::Closed)
    }
}

struct Driver {
    debouncer: DetectionDebouncer,
    settle_timer: Option<DelayedAction>,
    // Weak so a pending timer does not keep the driver alive
    mailbox: mpsc::WeakUnboundedSender<Command>,
    sink: Arc<dyn RecordingSink>,
}

impl Driver {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        info!(
            settle_ms = self.debouncer.settle_delay().as_millis() as u64,
            auto_record = self.debouncer.auto_record(),
            "Auto recorder started"
        );

        while let Some(command) = rx.recv().await {
            let step = match command {
                Command::Sample(sample) => self.debouncer.observe(&sample),
                Command::Settled(generation) => {
                    let decision = self.debouncer.settle(generation);
                    if self.debouncer.pending().is_none() {
                        self.settle_timer = None;
                    }
                    Step {
                        decision,
                        timer: TimerCommand::Keep,
                    }
                }
                Command::SetAutoRecord(enabled) => {
                    info!(enabled, "Auto-record toggled");
                    self.debouncer.set_auto_record(enabled)
                }
                Command::ManualStart => self.debouncer.manual_start(),
                Command::ManualStop => self.debouncer.manual_stop(),
                Command::Snapshot(reply) => {
                    let _ = reply.send(self.debouncer.snapshot());
                    continue;
                }
            };

            self.apply_timer(step.timer);
            if step.decision.is_actionable() {
                info!(decision = %step.decision, "Recording decision");
                counter!(DECISIONS_TOTAL, "decision" => step.decision.as_str()).increment(1);
                self.sink.apply(step.decision);
            }
        }

        debug!("Auto recorder stopped");
    }

    fn apply_timer(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::Keep => {}
            TimerCommand::Cancel => {
                if let Some(timer) = self.settle_timer.take() {
                    timer.cancel();
                    trace!("Settle timer cancelled");
                }
            }
            TimerCommand::Arm(settle) => {
                let mailbox = self.mailbox.clone();
                let generation = settle.generation;
                // Full delay from now; replacing the old handle cancels it
                self.settle_timer = Some(DelayedAction::once(
                    "settle",
                    self.settle_delay(),
                    move || {
                        if let Some(tx) = mailbox.upgrade() {
                            let _ = tx.send(Command::Settled(generation));
                        }
                    },
                ));
                trace!(generation, signal = settle.signal, "Settle timer armed");
            }
        }
    }

    fn settle_delay(&self) -> Duration {
        self.debouncer.settle_delay()
    }
}
