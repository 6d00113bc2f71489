//! Archive error types.

use thiserror::Error;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid archive entry: {0}")]
    InvalidEntry(String),

    #[error("Archive entry not found: {name}")]
    NotFound { name: String, remote_key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidEntry(msg.into())
    }
}
