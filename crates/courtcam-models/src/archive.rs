//! Archive log entries.

use serde::{Deserialize, Serialize};

/// Field delimiter of the archive log.
pub const ARCHIVE_DELIMITER: char = '|';

/// Characters that may never appear inside a remote key.
const FORBIDDEN_KEY_CHARS: [char; 4] = [ARCHIVE_DELIMITER, ',', '\n', '\r'];

/// Check that a remote key can be stored as a single archive field.
pub fn is_delimiter_safe(key: &str) -> bool {
    !key.is_empty() && !key.contains(FORBIDDEN_KEY_CHARS)
}

/// A saved analysis: display name, processed remote key and free-form notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub remote_key: String,
    #[serde(default)]
    pub notes: String,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, remote_key: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_key: remote_key.into(),
            notes: notes.into(),
        }
    }

    /// Whether two entries refer to the same saved analysis.
    pub fn same_record(&self, other: &ArchiveEntry) -> bool {
        self.name == other.name && self.remote_key == other.remote_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_safe_keys() {
        assert!(is_delimiter_safe("out/abc123.mp4"));
        assert!(is_delimiter_safe("uploads/2025-07-25_match.mov"));
        assert!(!is_delimiter_safe(""));
        assert!(!is_delimiter_safe("a|b"));
        assert!(!is_delimiter_safe("a,b"));
        assert!(!is_delimiter_safe("a\nb"));
    }

    #[test]
    fn test_same_record_ignores_notes() {
        let a = ArchiveEntry::new("Match", "out/k.mp4", "one");
        let b = ArchiveEntry::new("Match", "out/k.mp4", "two");
        let c = ArchiveEntry::new("Other", "out/k.mp4", "one");

        assert!(a.same_record(&b));
        assert!(!a.same_record(&c));
    }
}
