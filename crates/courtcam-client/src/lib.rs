//! Client for the remote tennis analysis service.
//!
//! The service owns all computer vision: it ingests a video, detects the
//! court, classifies strokes and renders an annotated copy. This crate
//! speaks its four endpoints (`/upload`, `/analyze3`, `/fetch`,
//! `/isCourt`) and nothing else. Every call is a single attempt; callers
//! decide what a failure means.

pub mod client;
pub mod error;
pub mod types;

pub use client::{AnalysisClient, AnalyzeParams, ClientConfig};
pub use error::{ClientError, ClientResult};
pub use types::{AnalyzeResponse, CourtResponse, UploadResponse};
