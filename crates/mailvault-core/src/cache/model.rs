//! Cache ledger data models.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk ledger format version.
pub const LEDGER_VERSION: u32 = 1;

/// What a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A cached message directory (metadata plus bodies).
    #[serde(alias = "email")]
    Content,
    /// A single downloaded attachment file.
    Attachment,
}

impl EntryKind {
    /// Convert to the on-disk string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Attachment => "attachment",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked piece of cached storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content-derived key.
    pub id: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes counted against the ledger limit.
    #[serde(rename = "size_bytes")]
    pub size: u64,
    /// When the entry was first recorded.
    pub cached_at: DateTime<Utc>,
    /// When the entry was last added or read.
    pub accessed_at: DateTime<Utc>,
    /// File or directory backing this entry.
    #[serde(rename = "file_path")]
    pub location: PathBuf,
}

impl CacheEntry {
    /// Creates a fresh entry stamped with `now`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: EntryKind,
        location: impl Into<PathBuf>,
        size: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            size,
            cached_at: now,
            accessed_at: now,
            location: location.into(),
        }
    }

    /// Time elapsed since the entry was cached.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.cached_at
    }

    /// An entry at or past `max_age` is no longer live.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) < max_age
    }
}

/// Durable ledger contents (`cache/cache_metadata.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Format version.
    #[serde(alias = "cache_version")]
    pub version: u32,
    /// Sum of all entry sizes.
    pub total_size_bytes: u64,
    /// Tracked entries, in insertion order.
    #[serde(default)]
    pub entries: Vec<CacheEntry>,
}

impl Default for LedgerRecord {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            total_size_bytes: 0,
            entries: Vec::new(),
        }
    }
}

impl LedgerRecord {
    /// Sum of the recorded entry sizes.
    #[must_use]
    pub fn entries_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Aggregate ledger statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Bytes currently recorded.
    pub total_size_bytes: u64,
    /// Configured limit.
    pub max_size_bytes: u64,
    /// Number of entries.
    pub entry_count: usize,
    /// Number of cached messages.
    pub content_count: usize,
    /// Number of cached attachments.
    pub attachment_count: usize,
    /// Earliest `cached_at`.
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Latest `cached_at`.
    pub newest_entry: Option<DateTime<Utc>>,
    /// When the statistics were taken.
    pub current_time: DateTime<Utc>,
}

/// What an eviction pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvictionSummary {
    /// Entries removed because they aged out.
    pub expired: usize,
    /// Entries removed to get back under the size limit.
    pub oversized: usize,
    /// Bytes released from the ledger.
    pub freed_bytes: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_yaml_and_accepts_legacy_name() {
        assert_eq!(serde_yaml::to_string(&EntryKind::Content).unwrap().trim(), "content");
        let legacy: EntryKind = serde_yaml::from_str("email").unwrap();
        assert_eq!(legacy, EntryKind::Content);
    }

    #[test]
    fn liveness_boundary() {
        let now = Utc::now();
        let mut entry = CacheEntry::new("a", EntryKind::Content, "/tmp/a", 1, now);
        assert!(entry.is_live(now, Duration::hours(24)));

        entry.cached_at = now - Duration::hours(24);
        assert!(!entry.is_live(now, Duration::hours(24)));
    }

    #[test]
    fn ledger_field_names_match_disk_format() {
        let now = Utc::now();
        let record = LedgerRecord {
            version: 1,
            total_size_bytes: 7,
            entries: vec![CacheEntry::new("m1", EntryKind::Attachment, "/x", 7, now)],
        };
        let yaml = serde_yaml::to_string(&record).unwrap();
        for key in ["version:", "total_size_bytes:", "type: attachment", "size_bytes: 7", "file_path:"] {
            assert!(yaml.contains(key), "missing {key} in {yaml}");
        }
    }
}
