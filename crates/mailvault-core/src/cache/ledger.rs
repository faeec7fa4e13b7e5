//! Per-account cache ledger.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use super::eviction::plan_eviction;
use super::model::{CacheEntry, CacheStats, EntryKind, EvictionSummary, LedgerRecord};
use crate::fsutil;
use crate::{Error, Result};

/// Entries older than this are dropped on the next eviction pass.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Bookkeeping of cached storage for one account, bounded by size and age.
///
/// The ledger is the single writer of its record file: every mutation holds
/// the write lock across load-modify-persist, so concurrent callers can't
/// lose updates or delete the same backing file twice. Statistics take the
/// read lock.
#[derive(Debug)]
pub struct CacheLedger {
    path: PathBuf,
    max_size: u64,
    max_age: Duration,
    state: RwLock<LedgerRecord>,
}

impl CacheLedger {
    /// Opens the ledger stored at `path`, starting empty if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn open(path: impl Into<PathBuf>, max_size: u64) -> Result<Self> {
        let path = path.into();
        let mut record = load_record(&path)?;

        let recorded = record.entries_size();
        if recorded != record.total_size_bytes {
            debug!(
                "Ledger {} total {} disagrees with entries {}, using entries",
                path.display(),
                record.total_size_bytes,
                recorded
            );
            record.total_size_bytes = recorded;
        }

        Ok(Self {
            path,
            max_size,
            max_age: Duration::hours(DEFAULT_MAX_AGE_HOURS),
            state: RwLock::new(record),
        })
    }

    /// Overrides the maximum entry age.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Configured size limit in bytes.
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Location of the ledger record.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records an entry, or refreshes its access time if `id` is known.
    ///
    /// A new entry larger than the whole limit is still accepted and becomes
    /// the first eviction candidate.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger can't be persisted.
    pub fn add_or_touch(
        &self,
        id: &str,
        kind: EntryKind,
        location: impl Into<PathBuf>,
        size: u64,
    ) -> Result<()> {
        let mut state = self.write()?;
        let now = Utc::now();

        if let Some(entry) = state.entries.iter_mut().find(|e| e.id == id) {
            entry.accessed_at = now;
            debug!("Touched cache entry {id}");
            return self.persist(&state);
        }

        state.entries.push(CacheEntry::new(id, kind, location, size, now));
        state.total_size_bytes += size;
        debug!("Added {kind} cache entry {id} ({size} bytes)");
        self.persist(&state)?;

        if state.total_size_bytes > self.max_size {
            self.evict_locked(&mut state)?;
        }
        Ok(())
    }

    /// Looks up an entry and refreshes its access time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` isn't recorded, or an error if the
    /// ledger can't be persisted.
    pub fn get(&self, id: &str) -> Result<CacheEntry> {
        let mut state = self.write()?;
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("cache entry {id}")))?;
        entry.accessed_at = Utc::now();
        let found = entry.clone();
        self.persist(&state)?;
        Ok(found)
    }

    /// Runs the age sweep and then, if still over the limit, the size sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger can't be persisted. Failures deleting
    /// individual backing files are logged and skipped.
    pub fn evict(&self) -> Result<EvictionSummary> {
        let mut state = self.write()?;
        self.evict_locked(&mut state)
    }

    /// Deletes every backing file and empties the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the emptied ledger can't be persisted.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.write()?;
        let cleared = LedgerRecord::default();
        self.persist(&cleared)?;

        let old = std::mem::replace(&mut *state, cleared);
        for entry in &old.entries {
            remove_backing(entry);
        }
        info!("Cleared {} cache entries from {}", old.entries.len(), self.path.display());
        Ok(())
    }

    /// Current statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger lock is poisoned.
    pub fn stats(&self) -> Result<CacheStats> {
        let state = self.read()?;
        let count = |kind| state.entries.iter().filter(|e| e.kind == kind).count();

        Ok(CacheStats {
            total_size_bytes: state.total_size_bytes,
            max_size_bytes: self.max_size,
            entry_count: state.entries.len(),
            content_count: count(EntryKind::Content),
            attachment_count: count(EntryKind::Attachment),
            oldest_entry: state.entries.iter().map(|e| e.cached_at).min(),
            newest_entry: state.entries.iter().map(|e| e.cached_at).max(),
            current_time: Utc::now(),
        })
    }

    /// Snapshot of the recorded entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger lock is poisoned.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.read()?.entries.clone())
    }

    fn evict_locked(&self, state: &mut LedgerRecord) -> Result<EvictionSummary> {
        let plan = plan_eviction(state.entries.clone(), Utc::now(), self.max_age, self.max_size);
        if plan.is_noop() {
            return Ok(EvictionSummary::default());
        }

        let next = LedgerRecord {
            version: state.version,
            total_size_bytes: plan.kept_size(),
            entries: plan.keep.clone(),
        };
        self.persist(&next)?;

        let summary = EvictionSummary {
            expired: plan.expired.len(),
            oversized: plan.oversized.len(),
            freed_bytes: state.total_size_bytes.saturating_sub(next.total_size_bytes),
        };
        *state = next;

        for entry in plan.evicted() {
            remove_backing(entry);
        }
        info!(
            "Evicted {} expired and {} oversized cache entries ({} bytes)",
            summary.expired, summary.oversized, summary.freed_bytes
        );
        Ok(summary)
    }

    fn persist(&self, record: &LedgerRecord) -> Result<()> {
        let yaml = serde_yaml::to_string(record)?;
        fsutil::write_atomic(&self.path, yaml.as_bytes())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerRecord>> {
        self.state.read().map_err(|_| Error::LockPoisoned("cache ledger"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerRecord>> {
        self.state.write().map_err(|_| Error::LockPoisoned("cache ledger"))
    }
}

fn load_record(path: &Path) -> Result<LedgerRecord> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LedgerRecord::default()),
        Err(e) => return Err(Error::io(format!("reading ledger {}", path.display()))(e)),
    };
    serde_yaml::from_str(&data)
        .map_err(|e| Error::Validation(format!("malformed ledger {}: {e}", path.display())))
}

fn remove_backing(entry: &CacheEntry) {
    if let Err(e) = fsutil::remove_path(&entry.location) {
        warn!(
            "Failed to delete cached {} {} at {}: {e}",
            entry.kind,
            entry.id,
            entry.location.display()
        );
    }
}
