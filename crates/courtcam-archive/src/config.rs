//! Archive configuration.

use std::path::PathBuf;

const ARCHIVE_FILE_NAME: &str = "archive_log.txt";

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub path: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("courtcam").join(ARCHIVE_FILE_NAME),
        }
    }
}

impl ArchiveConfig {
    /// Create config from environment variables.
    ///
    /// `COURTCAM_ARCHIVE_PATH` wins; otherwise the log lives in
    /// `COURTCAM_WORK_DIR` when that is set.
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var("COURTCAM_ARCHIVE_PATH") {
            return Self { path: path.into() };
        }
        match std::env::var("COURTCAM_WORK_DIR") {
            Ok(dir) => Self::in_dir(dir),
            Err(_) => Self::default(),
        }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(ARCHIVE_FILE_NAME),
        }
    }
}
