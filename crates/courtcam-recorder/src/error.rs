//! Recorder error types.

use thiserror::Error;

pub type RecorderResult<T> = Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Auto recorder has shut down")]
    Closed,

    #[error("Court classification failed: {0}")]
    Classifier(#[from] courtcam_client::ClientError),
}
