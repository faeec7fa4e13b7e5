//! Downloaded attachment cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::{CacheLedger, EntryKind};
use crate::{Error, Result};

/// Longest file extension carried into a cache id.
const MAX_EXTENSION_LEN: usize = 10;

/// Hex digits of the content hash kept in a cache id.
const ATTACHMENT_HASH_LEN: usize = 12;

/// Outcome of caching one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedAttachment {
    /// File name as sent.
    pub filename: String,
    /// Cache id, present only if the file was written.
    pub cache_id: Option<String>,
    /// Size of the payload in bytes.
    pub size: u64,
    /// Whether the payload was kept.
    pub saved: bool,
}

/// Attachment files for one account, registered with its ledger.
#[derive(Debug)]
pub struct AttachmentStore {
    dir: PathBuf,
    ledger: Arc<CacheLedger>,
    max_size: u64,
}

impl AttachmentStore {
    /// Creates a store rooted at `dir` (`cache/attachments`).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, ledger: Arc<CacheLedger>, max_size: u64) -> Self {
        Self {
            dir: dir.into(),
            ledger,
            max_size,
        }
    }

    /// Writes `data` and registers it, unless it exceeds the size limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger can't be persisted. A failed file
    /// write is reported as `saved = false`.
    pub fn save(&self, filename: &str, data: &[u8]) -> Result<SavedAttachment> {
        let size = data.len() as u64;
        let skipped = SavedAttachment {
            filename: filename.to_string(),
            cache_id: None,
            size,
            saved: false,
        };

        if size > self.max_size {
            debug!("Attachment {filename} ({size} bytes) exceeds limit of {} bytes", self.max_size);
            return Ok(skipped);
        }

        let id = attachment_id(filename, data);
        let path = self.dir.join(&id);
        let written = fs::create_dir_all(&self.dir).and_then(|()| fs::write(&path, data));
        if let Err(e) = written {
            warn!("Failed to cache attachment {filename} at {}: {e}", path.display());
            return Ok(skipped);
        }

        self.ledger.add_or_touch(&id, EntryKind::Attachment, &path, size)?;
        Ok(SavedAttachment {
            cache_id: Some(id),
            saved: true,
            ..skipped
        })
    }

    /// Location of a cached attachment, refreshing its access time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id isn't recorded or its file is
    /// gone.
    pub fn path(&self, cache_id: &str) -> Result<PathBuf> {
        let entry = self.ledger.get(cache_id)?;
        if entry.kind != EntryKind::Attachment || !entry.location.is_file() {
            return Err(Error::NotFound(format!("attachment {cache_id}")));
        }
        Ok(entry.location)
    }

    /// Bytes of a cached attachment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::path`], or an I/O error reading the file.
    pub fn load(&self, cache_id: &str) -> Result<Vec<u8>> {
        let path = self.path(cache_id)?;
        fs::read(&path).map_err(Error::io(format!("reading {}", path.display())))
    }
}

/// `att_{12 hex of SHA-256(filename ‖ data)}{extension or .bin}`.
#[must_use]
pub fn attachment_id(filename: &str, data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(data);
    let mut hash = format!("{:x}", hasher.finalize());
    hash.truncate(ATTACHMENT_HASH_LEN);
    format!("att_{hash}{}", extension(filename))
}

fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map_or_else(|| ".bin".to_string(), |ext| format!(".{ext}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(dir: &Path, max_size: u64) -> AttachmentStore {
        let ledger = CacheLedger::open(dir.join("cache_metadata.yaml"), 1024 * 1024).unwrap();
        AttachmentStore::new(dir.join("attachments"), Arc::new(ledger), max_size)
    }

    #[test]
    fn id_format() {
        let id = attachment_id("report.pdf", b"%PDF");
        assert!(id.starts_with("att_"));
        assert!(id.ends_with(".pdf"));
        assert_eq!(id.len(), "att_".len() + 12 + ".pdf".len());
        assert_eq!(id, attachment_id("report.pdf", b"%PDF"));
        assert_ne!(id, attachment_id("report.pdf", b"%PDF-2"));
        assert!(attachment_id("README", b"x").ends_with(".bin"));
        assert!(attachment_id("weird.../etc", b"x").ends_with(".bin"));
        // SHA-256("a") starts with ca978112ca1b.
        assert_eq!(attachment_id("a", b""), "att_ca978112ca1b.bin");
    }

    #[test]
    fn save_then_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);

        let saved = store.save("notes.txt", b"hello").unwrap();
        assert!(saved.saved);
        assert_eq!(saved.size, 5);
        let id = saved.cache_id.unwrap();

        assert_eq!(store.load(&id).unwrap(), b"hello");
        let entries = store.ledger.entries().unwrap();
        assert_eq!(entries[0].kind, EntryKind::Attachment);
        assert_eq!(entries[0].size, 5);
    }

    #[test]
    fn oversized_payload_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 4);

        let saved = store.save("big.bin", b"12345").unwrap();
        assert!(!saved.saved);
        assert!(saved.cache_id.is_none());
        assert!(store.ledger.entries().unwrap().is_empty());
    }

    #[test]
    fn unknown_or_deleted_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);
        assert!(matches!(store.path("att_missing.bin"), Err(Error::NotFound(_))));

        let id = store.save("a.txt", b"a").unwrap().cache_id.unwrap();
        fs::remove_file(dir.path().join("attachments").join(&id)).unwrap();
        assert!(matches!(store.path(&id), Err(Error::NotFound(_))));
    }
}
