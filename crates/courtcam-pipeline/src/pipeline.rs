//! Upload -> analyze -> fetch orchestration.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};
use uuid::Uuid;

use courtcam_models::{
    is_delimiter_safe, AnalysisJob, AnalysisResult, FailureKind, JobEvent, JobId, JobProgress,
};
use courtcam_timer::DelayedAction;

use crate::config::{PipelineConfig, SubmitPolicy};
use crate::error::{PipelineError, PipelineResult};
use crate::handle::JobHandle;
use crate::logging::JobLogger;
use crate::metrics;
use crate::notifier::{JobNotifier, LogNotifier};
use crate::service::AnalysisService;

/// Runs analysis jobs against a remote service, one at a time.
///
/// Each job makes exactly three requests in order and never retries; a
/// failure anywhere is terminal and the caller resubmits to try again.
pub struct UploadAnalyzePipeline<S: AnalysisService> {
    service: Arc<S>,
    config: PipelineConfig,
    notifier: Arc<dyn JobNotifier>,
    current: Mutex<Option<JobHandle>>,
}

impl<S: AnalysisService> UploadAnalyzePipeline<S> {
    pub fn new(service: S, config: PipelineConfig) -> Self {
        Self {
            service: Arc::new(service),
            config,
            notifier: Arc::new(LogNotifier),
            current: Mutex::new(None),
        }
    }

    /// Replace the default logging notifier.
    pub fn with_notifier(mut self, notifier: impl JobNotifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start a job for `source_file`.
    ///
    /// The file is checked before anything else: it must open, be a regular
    /// file and be non-empty, otherwise `InvalidInput` is returned and no
    /// request is made. Returns as soon as the job is spawned.
    pub async fn submit(&self, source_file: impl AsRef<Path>) -> PipelineResult<JobHandle> {
        let source_file = source_file.as_ref();
        if let Err(err) = validate_source(source_file).await {
            metrics::record_job_failed(err.kind());
            return Err(err);
        }

        let handle = {
            let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(previous) = current.as_ref().filter(|job| !job.is_terminal()) {
                match self.config.submit_policy {
                    SubmitPolicy::Reject => {
                        metrics::record_job_failed(FailureKind::Busy);
                        return Err(PipelineError::Busy(previous.id().clone()));
                    }
                    SubmitPolicy::Supersede => {
                        debug!(job_id = %previous.id(), "Superseding in-flight job");
                        previous.cancel();
                    }
                }
            }

            let handle = JobHandle::new(AnalysisJob::new(JobId::new(), source_file));
            *current = Some(handle.clone());
            handle
        };

        metrics::record_job_submitted();

        let logger = JobLogger::new(handle.id());
        let span = logger.span();
        tokio::spawn(
            run_job(
                Arc::clone(&self.service),
                self.config.clone(),
                handle.clone(),
                Arc::clone(&self.notifier),
                logger,
            )
            .instrument(span),
        );

        Ok(handle)
    }

    /// Non-blocking snapshot of a job.
    pub fn progress(&self, handle: &JobHandle) -> JobProgress {
        handle.progress()
    }

    /// Cancel a job. No-op for jobs that already finished.
    pub fn cancel(&self, handle: &JobHandle) -> bool {
        handle.cancel()
    }

    /// The most recently submitted job, finished or not.
    pub fn current(&self) -> Option<JobHandle> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

async fn validate_source(path: &Path) -> PipelineResult<()> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| PipelineError::invalid_input(format!("cannot open {}: {}", path.display(), e)))?;
    let meta = file
        .metadata()
        .await
        .map_err(|e| PipelineError::invalid_input(format!("cannot stat {}: {}", path.display(), e)))?;

    if !meta.is_file() {
        return Err(PipelineError::invalid_input(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    if meta.len() == 0 {
        return Err(PipelineError::invalid_input(format!("{} is empty", path.display())));
    }
    Ok(())
}

async fn run_job<S: AnalysisService>(
    service: Arc<S>,
    config: PipelineConfig,
    handle: JobHandle,
    notifier: Arc<dyn JobNotifier>,
    logger: JobLogger,
) {
    logger.log_submitted(&handle.source_file().display().to_string());

    match execute(service.as_ref(), &config, &handle, &logger).await {
        Ok(result) => {
            metrics::record_job_completed();
            logger.log_succeeded(&result);
            notifier.notify(&JobEvent::Succeeded { result });
        }
        Err(err) => {
            let kind = err.kind();
            if handle.record_failure(kind) {
                metrics::record_job_failed(kind);
                logger.log_failed(kind, &err.to_string());
                notifier.notify(&JobEvent::Failed {
                    job_id: handle.id().clone(),
                    kind,
                });
            } else {
                logger.log_discarded(&err.to_string());
            }
        }
    }
}

async fn execute<S: AnalysisService>(
    service: &S,
    config: &PipelineConfig,
    handle: &JobHandle,
    logger: &JobLogger,
) -> PipelineResult<AnalysisResult> {
    let token = handle.shared().token().clone();
    let source = handle.source_file();

    // 1) Upload
    handle.advance(FailureKind::UploadFailed, |job| job.begin_upload())?;
    let started = logger.begin_phase("upload", &format!("sending {}", source.display()));
    let upload = until_cancelled(&token, service.upload(&source))
        .await?
        .map_err(|e| PipelineError::upload_failed(e.to_string()))?;
    logger.finish_phase("upload", started);

    let remote_key = upload.s3_key;
    handle.advance(FailureKind::UploadFailed, |job| {
        job.record_upload(remote_key.clone(), upload.estimated_time)
    })?;

    // 2) Analyze, with the cosmetic tick running only for this phase
    let started = logger.begin_phase(
        "analyze",
        &format!("key {} estimated {:.1}s", remote_key, upload.estimated_time),
    );
    let ticker = start_ticker(handle, config.tick_interval);
    let analysis = until_cancelled(&token, service.analyze(&remote_key)).await;
    ticker.cancel();
    let analysis = analysis?.map_err(|e| PipelineError::analyze_failed(e.to_string()))?;
    logger.finish_phase("analyze", started);

    if !is_delimiter_safe(&analysis.video_path) {
        return Err(PipelineError::analyze_failed(format!(
            "unusable video key '{}'",
            analysis.video_path
        )));
    }
    handle.advance(FailureKind::AnalyzeFailed, |job| job.begin_fetch())?;

    // 3) Fetch
    let started = logger.begin_phase("fetch", &format!("downloading {}", analysis.video_path));
    let video = until_cancelled(&token, service.fetch(&analysis.video_path))
        .await?
        .map_err(|e| PipelineError::fetch_failed(e.to_string()))?;
    if video.is_empty() {
        return Err(PipelineError::fetch_failed("empty video body"));
    }
    let result_file = write_result(&config.work_dir, &video)
        .await
        .map_err(|e| PipelineError::fetch_failed(format!("cannot write result: {}", e)))?;
    logger.finish_phase("fetch", started);

    let result = AnalysisResult {
        job_id: handle.id().clone(),
        remote_key,
        video_key: analysis.video_path,
        result_file,
        stroke_counts: analysis.stroke_counts,
        processing_time_seconds: analysis.processing_time_seconds,
    };

    if let Err(err) = handle.complete(result.clone()) {
        // Cancelled while writing; the file belongs to nobody now
        let _ = tokio::fs::remove_file(&result.result_file).await;
        return Err(err);
    }
    Ok(result)
}

/// Race a request against job cancellation. A cancelled request is dropped.
async fn until_cancelled<F: Future>(token: &CancellationToken, request: F) -> PipelineResult<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(PipelineError::Cancelled),
        output = request => Ok(output),
    }
}

fn start_ticker(handle: &JobHandle, period: Duration) -> DelayedAction {
    let shared = Arc::clone(handle.shared());
    DelayedAction::repeating("progress_tick", period, move || shared.write().tick(period))
}

/// Write the processed video to a fresh `processed_<uuid>.mp4`.
async fn write_result(work_dir: &Path, video: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(work_dir).await?;
    let path = work_dir.join(format!("processed_{}.mp4", Uuid::new_v4()));

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;
    let written = async {
        file.write_all(video).await?;
        file.sync_all().await
    }
    .await;

    if let Err(err) = written {
        drop(file);
        let _ = tokio::fs::remove_file(&path).await;
        return Err(err);
    }
    Ok(path)
}
