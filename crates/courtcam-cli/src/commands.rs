//! Subcommand implementations.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{info, warn};

use courtcam_archive::{ArchiveConfig, ArchiveLog};
use courtcam_client::{AnalysisClient, ClientConfig};
use courtcam_models::{DetectionSample, JobProgress};
use courtcam_pipeline::{LogNotifier, PipelineConfig, UploadAnalyzePipeline};
use courtcam_recorder::{AutoRecorder, RecorderConfig};

use crate::cli::ArchiveAction;

const PROGRESS_POLL: Duration = Duration::from_secs(1);

pub fn client_config(api_url: Option<String>) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = api_url {
        config.base_url = url;
    }
    config
}

pub async fn analyze(
    client_config: ClientConfig,
    file: &Path,
    archive_name: Option<String>,
    archive_now: bool,
) -> Result<()> {
    let client = AnalysisClient::new(client_config).context("Failed to create analysis client")?;
    let pipeline = UploadAnalyzePipeline::new(client, PipelineConfig::from_env()).with_notifier(LogNotifier);

    let handle = pipeline
        .submit(file)
        .await
        .with_context(|| format!("Cannot analyse {}", file.display()))?;
    info!(job_id = %handle.id(), file = %file.display(), "Submitted");

    let outcome = loop {
        tokio::select! {
            outcome = handle.wait() => break outcome,
            _ = tokio::time::sleep(PROGRESS_POLL) => {
                println!("{}", progress_line(&pipeline.progress(&handle)));
            }
            _ = tokio::signal::ctrl_c() => {
                pipeline.cancel(&handle);
                println!("Cancelled");
            }
        }
    };

    let result = match outcome {
        Ok(result) => result,
        Err(kind) => bail!("{} ({})", kind.user_message(), kind),
    };

    if result.stroke_counts.is_empty() {
        println!("No strokes detected");
    }
    println!("{}", result.stroke_counts.summary());
    println!("Result: {}", result.result_file.display());

    let entry = match (archive_name, archive_now) {
        (Some(name), _) => Some(result.archive_entry(name)),
        (None, true) => Some(result.archive_entry_now()),
        (None, false) => None,
    };
    if let Some(entry) = entry {
        let log = ArchiveLog::from_config(&ArchiveConfig::from_env());
        if log.append(&entry).await? {
            println!("Archived as {:?}", entry.name);
        } else {
            println!("Already archived as {:?}", entry.name);
        }
    }
    Ok(())
}

fn progress_line(progress: &JobProgress) -> String {
    match progress.estimated_duration_seconds {
        Some(estimate) => format!(
            "{:<10} {:>5.1}%  ({:.0}s of ~{:.0}s)",
            progress.state.as_str(),
            progress.fraction() * 100.0,
            progress.elapsed_seconds,
            estimate
        ),
        None => progress.state.as_str().to_string(),
    }
}

pub async fn archive(action: ArchiveAction) -> Result<()> {
    let log = ArchiveLog::from_config(&ArchiveConfig::from_env());
    match action {
        ArchiveAction::List => {
            let entries = log.load().await?;
            if entries.is_empty() {
                println!("Archive is empty ({})", log.path().display());
            }
            for entry in entries {
                println!("{}\t{}\t{}", entry.name, entry.remote_key, entry.notes);
            }
        }
        ArchiveAction::Clear => {
            log.clear().await?;
            println!("Archive cleared");
        }
        ArchiveAction::Notes {
            name,
            remote_key,
            notes,
        } => {
            log.update_notes(&name, &remote_key, &notes).await?;
            println!("Notes updated");
        }
    }
    Ok(())
}

pub async fn check_court(client_config: ClientConfig, image: &Path) -> Result<()> {
    let jpeg = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let client = AnalysisClient::new(client_config).context("Failed to create analysis client")?;
    let is_court = client.is_court(Bytes::from(jpeg)).await?;
    println!("{is_court}");
    Ok(())
}

/// Feed a fixed detection sequence through the auto-recorder in real time
/// and print each decision with its offset from the first sample.
pub async fn debounce(detections: &[bool], interval: Duration) -> Result<()> {
    if detections.is_empty() {
        bail!("No detections given");
    }

    let config = RecorderConfig::from_env();
    let tail = config.settle_delay + interval;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let recorder = AutoRecorder::spawn(config, tx);

    let start = tokio::time::Instant::now();
    let printer = tokio::spawn(async move {
        while let Some(decision) = rx.recv().await {
            println!("{:>6} ms  {}", start.elapsed().as_millis(), decision);
        }
    });

    for &is_court in detections {
        recorder.observe(DetectionSample::now(is_court))?;
        tokio::time::sleep(interval).await;
    }
    // Let a trailing flip settle
    tokio::time::sleep(tail).await;

    let snapshot = recorder.snapshot().await?;
    drop(recorder);
    if printer.await.is_err() {
        warn!("Decision printer panicked");
    }
    println!(
        "recording: {}  court: {}",
        snapshot.is_recording, snapshot.last_stable
    );
    Ok(())
}
