//! Job handles: the caller's view of a running analysis.

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use courtcam_models::{AnalysisJob, AnalysisResult, FailureKind, JobId, JobProgress, ModelError};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// Terminal outcome of a job.
pub type JobOutcome = Result<AnalysisResult, FailureKind>;

/// State shared between a handle and the task driving the job.
#[derive(Debug)]
pub(crate) struct JobShared {
    job: RwLock<AnalysisJob>,
    cancel: CancellationToken,
    outcome: watch::Sender<Option<JobOutcome>>,
}

impl JobShared {
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, AnalysisJob> {
        // A panic while holding the lock leaves the job data intact
        self.job.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, AnalysisJob> {
        self.job.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn publish(&self, outcome: JobOutcome) {
        self.outcome.send_replace(Some(outcome));
    }
}

/// Opaque handle to one submitted job. Cheap to clone.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    shared: Arc<JobShared>,
}

impl JobHandle {
    pub(crate) fn new(job: AnalysisJob) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            id: job.id().clone(),
            shared: Arc::new(JobShared {
                job: RwLock::new(job),
                cancel: CancellationToken::new(),
                outcome,
            }),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Non-blocking snapshot of the job.
    pub fn progress(&self) -> JobProgress {
        self.shared.read().progress()
    }

    pub fn is_terminal(&self) -> bool {
        self.shared.read().is_terminal()
    }

    pub fn source_file(&self) -> PathBuf {
        self.shared.read().source_file().to_path_buf()
    }

    /// Request cancellation.
    ///
    /// Returns `false` when the job had already finished; cancelling a
    /// terminal job changes nothing.
    pub fn cancel(&self) -> bool {
        if self.shared.write().fail(FailureKind::Cancelled).is_err() {
            return false;
        }
        self.shared.cancel.cancel();
        self.shared.publish(Err(FailureKind::Cancelled));
        metrics::record_job_failed(FailureKind::Cancelled);
        true
    }

    /// Terminal outcome, if the job has finished.
    pub fn outcome(&self) -> Option<JobOutcome> {
        self.shared.outcome.borrow().clone()
    }

    /// Wait for the terminal outcome.
    pub async fn wait(&self) -> JobOutcome {
        let mut rx = self.shared.outcome.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(FailureKind::Cancelled)),
            Err(_) => Err(FailureKind::Cancelled),
        };
        outcome
    }

    pub(crate) fn shared(&self) -> &Arc<JobShared> {
        &self.shared
    }

    /// Apply a state transition.
    ///
    /// A job that already reached a terminal state (cancelled or
    /// superseded) surfaces as `Cancelled`; any other model error becomes a
    /// failure of kind `on_error`.
    pub(crate) fn advance<T>(
        &self,
        on_error: FailureKind,
        transition: impl FnOnce(&mut AnalysisJob) -> Result<T, ModelError>,
    ) -> PipelineResult<T> {
        let mut job = self.shared.write();
        transition(&mut *job).map_err(|err| match err {
            ModelError::AlreadyTerminal(_) => PipelineError::Cancelled,
            other => PipelineError::for_kind(on_error, other.to_string()),
        })
    }

    /// Move the job to `Succeeded` and publish the result.
    pub(crate) fn complete(&self, result: AnalysisResult) -> PipelineResult<()> {
        self.advance(FailureKind::FetchFailed, |job| {
            job.succeed(result.result_file.clone(), result.stroke_counts.clone())
        })?;
        self.shared.publish(Ok(result));
        Ok(())
    }

    /// Move the job to `Failed`. Returns `false` if it was already terminal.
    pub(crate) fn record_failure(&self, kind: FailureKind) -> bool {
        if self.shared.write().fail(kind).is_err() {
            return false;
        }
        self.shared.publish(Err(kind));
        true
    }
}
