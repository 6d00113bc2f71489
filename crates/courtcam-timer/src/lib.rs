//! Cancellable delayed actions.
//!
//! One primitive backs every component-owned timer in CourtCam: the
//! debouncer's settle timer (fires once) and the pipeline's progress tick
//! (fires repeatedly). Both are a spawned task raced against a
//! [`CancellationToken`]; dropping the handle cancels the task, so a timer
//! can never outlive its owner.
//!
//! Construction must happen inside a tokio runtime.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Handle to a scheduled action. Cancelled on drop.
#[derive(Debug)]
pub struct DelayedAction {
    name: &'static str,
    token: CancellationToken,
    stopped: AtomicBool,
    task: JoinHandle<()>,
}

impl DelayedAction {
    /// Run `action` once after `delay`, unless cancelled first.
    pub fn once<F>(name: &'static str, delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::spawn(name, async move {
            time::sleep(delay).await;
            action();
        })
    }

    /// Run `action` every `period`, first run one period from now.
    ///
    /// The action returns `false` to stop the schedule from the inside.
    pub fn repeating<F>(name: &'static str, period: Duration, mut action: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Self::spawn(name, async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !action() {
                    trace!(timer = name, "repeating action finished");
                    break;
                }
            }
        })
    }

    fn spawn<Fut>(name: &'static str, body: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = child.cancelled() => {
                    trace!(timer = name, "action cancelled");
                }
                _ = body => {}
            }
        });

        Self {
            name,
            token,
            stopped: AtomicBool::new(false),
            task,
        }
    }

    /// Cancel the action. Returns `true` only for the call that stopped it.
    pub fn cancel(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        trace!(timer = self.name, "cancel requested");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True while the action may still run.
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.task.is_finished()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for DelayedAction {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
