//! Analysis service request/response types.

use serde::{Deserialize, Serialize};

use courtcam_models::StrokeCounts;

/// Response from `POST /upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Object key of the uploaded video
    pub s3_key: String,
    /// Server estimate of the analysis time, in seconds
    pub estimated_time: f64,
}

/// Response from `/analyze3`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Key of the processed video, passed to `/fetch`
    pub video_path: String,
    #[serde(default)]
    pub heatmap_paths: Vec<String>,
    #[serde(default)]
    pub heatmap_folder: String,
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
    #[serde(default)]
    pub stroke_counts: StrokeCounts,
}

/// Response from `POST /isCourt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtResponse {
    pub is_court: bool,
}
