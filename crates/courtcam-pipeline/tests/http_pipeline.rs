//! End-to-end pipeline tests against a mocked analysis service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use courtcam_client::{AnalysisClient, ClientConfig};
use courtcam_models::{FailureKind, JobEvent, JobState, Side, StrokeType};
use courtcam_pipeline::{PipelineConfig, UploadAnalyzePipeline};

fn pipeline_for(
    server: &MockServer,
    work_dir: &Path,
) -> (UploadAnalyzePipeline<AnalysisClient>, mpsc::UnboundedReceiver<JobEvent>) {
    let client = AnalysisClient::new(ClientConfig::with_base_url(server.uri())).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = UploadAnalyzePipeline::new(client, PipelineConfig::with_work_dir(work_dir))
        .with_notifier(tx);
    (pipeline, rx)
}

fn source_file(dir: &Path) -> PathBuf {
    let path = dir.join("rally.mp4");
    std::fs::write(&path, b"raw rally footage").unwrap();
    path
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

async fn mount_upload(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_job_end_to_end() {
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"s3_key": "abc123", "estimated_time": 42.0})),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/analyze3"))
        .and(query_param("key", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_path": "out/abc123.mp4",
            "stroke_counts": {"near": {"forehand": 3}, "far": {}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fetch"))
        .and(query_param("key", "out/abc123.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"processed rally".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (pipeline, mut events) = pipeline_for(&server, &dir.path().join("results"));

    let handle = pipeline.submit(source_file(dir.path())).await.unwrap();
    let result = handle.wait().await.unwrap();

    let progress = pipeline.progress(&handle);
    assert_eq!(progress.state, JobState::Succeeded);
    assert_eq!(progress.estimated_duration_seconds, Some(42.0));
    assert_eq!(result.remote_key, "abc123");
    assert_eq!(result.video_key, "out/abc123.mp4");
    assert_eq!(result.stroke_counts.get(Side::Near, StrokeType::Forehand), 3);
    assert_eq!(result.stroke_counts.get(Side::Far, StrokeType::Backhand), 0);
    assert_eq!(std::fs::read(&result.result_file).unwrap(), b"processed rally");

    match events.recv().await {
        Some(JobEvent::Succeeded { result: notified }) => assert_eq!(notified, result),
        other => panic!("unexpected event {:?}", other),
    }
    assert!(events.try_recv().is_err());

    assert_eq!(request_paths(&server).await, vec!["/upload", "/analyze3", "/fetch"]);

    // Terminal jobs ignore cancellation
    assert!(!pipeline.cancel(&handle));
    assert_eq!(handle.progress().state, JobState::Succeeded);
}

#[tokio::test]
async fn test_upload_500_stops_the_job() {
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(500).set_body_string("boom")).await;
    Mock::given(path("/analyze3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(path("/fetch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (pipeline, mut events) = pipeline_for(&server, dir.path());

    let handle = pipeline.submit(source_file(dir.path())).await.unwrap();
    assert_eq!(handle.wait().await, Err(FailureKind::UploadFailed));

    let progress = handle.progress();
    assert_eq!(progress.state, JobState::Failed);
    assert_eq!(progress.failure, Some(FailureKind::UploadFailed));
    assert_eq!(progress.estimated_duration_seconds, None);
    assert!(matches!(
        events.recv().await,
        Some(JobEvent::Failed { kind: FailureKind::UploadFailed, .. })
    ));
    assert_eq!(request_paths(&server).await, vec!["/upload"]);
}

#[tokio::test]
async fn test_malformed_analysis_payload_is_analyze_failure() {
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"s3_key": "abc123", "estimated_time": 5.0})),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/analyze3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stroke_counts": {}})))
        .mount(&server)
        .await;
    Mock::given(path("/fetch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _events) = pipeline_for(&server, dir.path());

    let handle = pipeline.submit(source_file(dir.path())).await.unwrap();
    assert_eq!(handle.wait().await, Err(FailureKind::AnalyzeFailed));
}

#[tokio::test]
async fn test_fetch_404_is_fetch_failure() {
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"s3_key": "abc123", "estimated_time": 5.0})),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/analyze3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"video_path": "out/abc123.mp4"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fetch"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results");
    let (pipeline, _events) = pipeline_for(&server, &results);

    let handle = pipeline.submit(source_file(dir.path())).await.unwrap();
    assert_eq!(handle.wait().await, Err(FailureKind::FetchFailed));
    assert!(!results.exists() || std::fs::read_dir(&results).unwrap().next().is_none());
}

#[tokio::test]
async fn test_analyze_is_not_issued_before_upload_returns() {
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({"s3_key": "abc123", "estimated_time": 1.0}))
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/analyze3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"video_path": "out/abc123.mp4"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"v".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _events) = pipeline_for(&server, dir.path());

    let handle = pipeline.submit(source_file(dir.path())).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.progress().state, JobState::Uploading);
    assert!(!request_paths(&server).await.iter().any(|p| p == "/analyze3"));

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(handle.progress().state, JobState::Analyzing);
    assert!(!request_paths(&server).await.iter().any(|p| p == "/fetch"));

    assert!(handle.wait().await.is_ok());
    assert_eq!(request_paths(&server).await, vec!["/upload", "/analyze3", "/fetch"]);
}

#[tokio::test]
async fn test_cancel_during_upload_prevents_later_phases() {
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({"s3_key": "abc123", "estimated_time": 1.0}))
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    Mock::given(path("/analyze3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _events) = pipeline_for(&server, dir.path());

    let handle = pipeline.submit(source_file(dir.path())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(pipeline.cancel(&handle));
    assert_eq!(handle.wait().await, Err(FailureKind::Cancelled));

    // Give a late upload response time to arrive; it must change nothing
    tokio::time::sleep(Duration::from_millis(400)).await;
    let progress = handle.progress();
    assert_eq!(progress.state, JobState::Failed);
    assert_eq!(progress.failure, Some(FailureKind::Cancelled));
    assert!(progress.estimated_duration_seconds.is_none());
}
