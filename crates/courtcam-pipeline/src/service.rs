//! Remote analysis service seam.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use courtcam_client::{AnalysisClient, AnalyzeResponse, ClientResult, UploadResponse};

/// The three remote calls a job is made of.
#[async_trait]
pub trait AnalysisService: Send + Sync + 'static {
    /// Send the source video; returns its key and the analysis estimate.
    async fn upload(&self, source: &Path) -> ClientResult<UploadResponse>;

    /// Analyze an uploaded video. Long-lived.
    async fn analyze(&self, remote_key: &str) -> ClientResult<AnalyzeResponse>;

    /// Download a processed video.
    async fn fetch(&self, video_key: &str) -> ClientResult<Bytes>;
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn upload(&self, source: &Path) -> ClientResult<UploadResponse> {
        AnalysisClient::upload(self, source).await
    }

    async fn analyze(&self, remote_key: &str) -> ClientResult<AnalyzeResponse> {
        AnalysisClient::analyze(self, remote_key).await
    }

    async fn fetch(&self, video_key: &str) -> ClientResult<Bytes> {
        AnalysisClient::fetch(self, video_key).await
    }
}
