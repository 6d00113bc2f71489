//! Analysis service HTTP client.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::types::{AnalyzeResponse, CourtResponse, UploadResponse};

/// Fixed parameters sent with every analysis request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzeParams {
    /// Detection confidence threshold
    pub thresh: f32,
    /// Analyze every Nth frame
    pub sample_rate: u32,
    /// Frames per inference batch
    pub batch_size: u32,
}

impl Default for AnalyzeParams {
    fn default() -> Self {
        Self {
            thresh: 0.3,
            sample_rate: 1,
            batch_size: 30,
        }
    }
}

impl AnalyzeParams {
    /// Create params from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            thresh: env_parse("COURTCAM_THRESH").unwrap_or(defaults.thresh),
            sample_rate: env_parse("COURTCAM_SAMPLE_RATE").unwrap_or(defaults.sample_rate),
            batch_size: env_parse("COURTCAM_BATCH_SIZE").unwrap_or(defaults.batch_size),
        }
    }
}

/// Configuration for the analysis client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the analysis service
    pub base_url: String,
    /// Whole-request timeout; analysis calls block until the server finishes
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    pub analyze: AnalyzeParams,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(600), // 10 minutes for long matches
            connect_timeout: Duration::from_secs(30),
            analyze: AnalyzeParams::default(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("COURTCAM_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timeout: Duration::from_secs(env_parse("COURTCAM_API_TIMEOUT").unwrap_or(600)),
            connect_timeout: Duration::from_secs(
                env_parse("COURTCAM_CONNECT_TIMEOUT").unwrap_or(30),
            ),
            analyze: AnalyzeParams::from_env(),
        }
    }

    /// Config pointing at `base_url`, everything else default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Client for the analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: Client,
    config: ClientConfig,
}

impl AnalysisClient {
    /// Create a new analysis client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload a local video file.
    pub async fn upload(&self, path: &Path) -> ClientResult<UploadResponse> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::InvalidRequest(format!("no file name in {}", path.display())))?
            .to_string();
        let mime = video_mime(path);
        let data = tokio::fs::read(path).await?;

        self.upload_bytes(file_name, &mime, data).await
    }

    /// Upload an in-memory video as the multipart `file` field.
    pub async fn upload_bytes(
        &self,
        file_name: String,
        mime: &str,
        data: Vec<u8>,
    ) -> ClientResult<UploadResponse> {
        let url = self.endpoint("upload");
        debug!(bytes = data.len(), "Uploading {} to {}", file_name, url);

        let part = Part::bytes(data).file_name(file_name).mime_str(mime)?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = Self::check_status("upload", response).await?;
        Self::decode("upload", response).await
    }

    /// Run the analysis of an uploaded video. Blocks until the server is done.
    pub async fn analyze(&self, key: &str) -> ClientResult<AnalyzeResponse> {
        let url = self.endpoint("analyze3");
        let params = self.config.analyze;
        debug!(key, "Requesting analysis from {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", key.to_string()),
                ("thresh", params.thresh.to_string()),
                ("sample_rate", params.sample_rate.to_string()),
                ("batch_size", params.batch_size.to_string()),
            ])
            .send()
            .await?;
        let response = Self::check_status("analyze", response).await?;
        Self::decode("analyze", response).await
    }

    /// Download a processed video.
    pub async fn fetch(&self, video_key: &str) -> ClientResult<Bytes> {
        let url = self.endpoint("fetch");
        debug!(video_key, "Fetching processed video from {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("key", video_key)])
            .send()
            .await?;
        let response = Self::check_status("fetch", response).await?;
        Ok(response.bytes().await?)
    }

    /// Ask the service whether a JPEG frame shows a tennis court.
    pub async fn is_court(&self, jpeg: Bytes) -> ClientResult<bool> {
        let url = self.endpoint("isCourt");

        let len = jpeg.len() as u64;
        let part = Part::stream_with_length(jpeg, len)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = Self::check_status("is_court", response).await?;
        let court: CourtResponse = Self::decode("is_court", response).await?;
        Ok(court.is_court)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Anything but 200 is a failure, including other 2xx codes.
    async fn check_status(endpoint: &'static str, response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("{} returned {}: {}", endpoint, status, body);
        Err(ClientError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(endpoint: &'static str, response: Response) -> ClientResult<T> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::InvalidResponse { endpoint, source })
    }
}

/// `video/<extension>`, falling back to mp4.
fn video_mime(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "mp4".to_string());
    match ext.as_str() {
        "mov" => "video/quicktime".to_string(),
        other => format!("video/{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AnalysisClient {
        AnalysisClient::new(ClientConfig::with_base_url(server.uri())).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.analyze, AnalyzeParams::default());
        assert_eq!(config.analyze.batch_size, 30);
    }

    #[test]
    fn test_video_mime() {
        assert_eq!(video_mime(Path::new("/a/match.MP4")), "video/mp4");
        assert_eq!(video_mime(Path::new("/a/match.mov")), "video/quicktime");
        assert_eq!(video_mime(Path::new("/a/match")), "video/mp4");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = AnalysisClient::new(ClientConfig::with_base_url("http://svc:9000/")).unwrap();
        assert_eq!(client.endpoint("fetch"), "http://svc:9000/fetch");
    }

    #[tokio::test]
    async fn test_upload_decodes_key_and_estimate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"s3_key": "abc123", "estimated_time": 42.0})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("match.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let response = assert_ok!(client_for(&server).upload(&video).await);
        assert_eq!(response.s3_key, "abc123");
        assert_eq!(response.estimated_time, 42.0);

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"match.mp4\""));
        assert!(body.contains("not really a video"));
    }

    #[tokio::test]
    async fn test_analyze_sends_fixed_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analyze3"))
            .and(query_param("key", "abc123"))
            .and(query_param("thresh", "0.3"))
            .and(query_param("sample_rate", "1"))
            .and(query_param("batch_size", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "video_path": "out/abc123.mp4",
                "stroke_counts": {"near": {"forehand": 3}, "far": {}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).analyze("abc123").await.unwrap();
        assert_eq!(response.video_path, "out/abc123.mp4");
    }

    #[tokio::test]
    async fn test_non_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("out/x.mp4").await.unwrap_err();
        assert_eq!(err.status(), Some(204));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analyze3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).analyze("abc").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse { endpoint: "analyze", .. }));
    }

    #[tokio::test]
    async fn test_is_court() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/isCourt"))
            .and(header_exists("content-length"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_court": true})))
            .expect(1)
            .mount(&server)
            .await;

        let is_court = client_for(&server)
            .is_court(Bytes::from_static(b"\xff\xd8\xff"))
            .await
            .unwrap();
        assert!(is_court);

        // Sent as a sized body, not chunked
        let requests = server.received_requests().await.unwrap();
        let body = &requests[0].body;
        assert!(body.windows(3).any(|w| w == b"\xff\xd8\xff"));
        assert!(String::from_utf8_lossy(body).contains("filename=\"frame.jpg\""));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Reserve a free port, then release it so nothing listens there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client =
            AnalysisClient::new(ClientConfig::with_base_url(format!("http://127.0.0.1:{port}"))).unwrap();
        let err = client.fetch("out/x.mp4").await.unwrap_err();
        assert!(err.is_transport());
    }
}
