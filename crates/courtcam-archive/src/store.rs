//! File-backed archive log.

use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use courtcam_models::{is_delimiter_safe, ArchiveEntry, ARCHIVE_DELIMITER};

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, ArchiveResult};

/// Parse one archive line.
///
/// Lines with fewer than two fields yield `None`. Fields past the second
/// are joined back into the notes with `,`.
pub fn parse_line(line: &str) -> Option<ArchiveEntry> {
    let mut parts = line.split(ARCHIVE_DELIMITER);
    let name = parts.next()?;
    let remote_key = parts.next()?;
    let notes = parts.collect::<Vec<_>>().join(",");
    Some(ArchiveEntry::new(name, remote_key, notes))
}

/// Render an entry as one archive line, without the trailing newline.
pub fn render_line(entry: &ArchiveEntry) -> ArchiveResult<String> {
    validate(entry)?;
    Ok(format!(
        "{name}{d}{key}{d}{notes}",
        name = entry.name,
        key = entry.remote_key,
        notes = flatten(&entry.notes),
        d = ARCHIVE_DELIMITER,
    ))
}

fn flatten(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

fn validate(entry: &ArchiveEntry) -> ArchiveResult<()> {
    if entry.name.trim().is_empty() {
        return Err(ArchiveError::invalid("name is empty"));
    }
    if entry.name.contains(ARCHIVE_DELIMITER) || entry.name.contains(['\n', '\r']) {
        return Err(ArchiveError::invalid(format!(
            "name {:?} contains a reserved character",
            entry.name
        )));
    }
    if !is_delimiter_safe(&entry.remote_key) {
        return Err(ArchiveError::invalid(format!(
            "remote key {:?} is not delimiter-safe",
            entry.remote_key
        )));
    }
    if entry.notes.contains(ARCHIVE_DELIMITER) {
        return Err(ArchiveError::invalid("notes contain the field delimiter"));
    }
    Ok(())
}

/// Archive log stored at a single path.
///
/// All operations on one `ArchiveLog` are serialised; separate instances
/// over the same file are not coordinated.
#[derive(Debug)]
pub struct ArchiveLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ArchiveLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry. A missing file is an empty log.
    pub async fn load(&self) -> ArchiveResult<Vec<ArchiveEntry>> {
        let _guard = self.lock.lock().await;
        self.read_entries().await
    }

    /// Append an entry unless one with the same name and key exists.
    ///
    /// Returns `false` when the entry was a duplicate.
    pub async fn append(&self, entry: &ArchiveEntry) -> ArchiveResult<bool> {
        let line = render_line(entry)?;

        let _guard = self.lock.lock().await;
        let existing = self.read_entries().await?;
        if existing.iter().any(|e| e.same_record(entry)) {
            debug!(name = %entry.name, key = %entry.remote_key, "Archive entry already present");
            return Ok(false);
        }

        self.ensure_parent().await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;

        info!(name = %entry.name, key = %entry.remote_key, "Archived analysis");
        Ok(true)
    }

    /// Replace the whole log.
    ///
    /// Written to a sibling temp file first and renamed into place, so a
    /// crash leaves either the old or the new log.
    pub async fn save(&self, entries: &[ArchiveEntry]) -> ArchiveResult<()> {
        let mut text = String::new();
        for entry in entries {
            text.push_str(&render_line(entry)?);
            text.push('\n');
        }

        let _guard = self.lock.lock().await;
        self.write_atomic(&text).await
    }

    /// Remove every entry.
    pub async fn clear(&self) -> ArchiveResult<()> {
        let _guard = self.lock.lock().await;
        if fs::try_exists(&self.path).await? {
            fs::write(&self.path, b"").await?;
        }
        info!(path = %self.path.display(), "Archive cleared");
        Ok(())
    }

    /// Replace the notes of one entry.
    pub async fn update_notes(&self, name: &str, remote_key: &str, notes: &str) -> ArchiveResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;

        let entry = entries
            .iter_mut()
            .find(|e| e.name == name && e.remote_key == remote_key)
            .ok_or_else(|| ArchiveError::NotFound {
                name: name.to_string(),
                remote_key: remote_key.to_string(),
            })?;
        entry.notes = notes.to_string();

        let mut text = String::new();
        for entry in &entries {
            text.push_str(&render_line(entry)?);
            text.push('\n');
        }
        self.write_atomic(&text).await
    }

    async fn read_entries(&self) -> ArchiveResult<Vec<ArchiveEntry>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some(entry) => entries.push(entry),
                None => warn!(line = index + 1, "Skipping malformed archive line"),
            }
        }
        Ok(entries)
    }

    async fn write_atomic(&self, text: &str) -> ArchiveResult<()> {
        self.ensure_parent().await?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn ensure_parent(&self) -> ArchiveResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}
