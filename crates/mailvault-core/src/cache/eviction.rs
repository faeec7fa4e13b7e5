//! Two-phase eviction planning.
//!
//! The plan is computed without touching the filesystem; the ledger applies
//! it and deletes backing storage afterwards.

use chrono::{DateTime, Duration, Utc};

use super::model::CacheEntry;

/// Partition of a ledger's entries produced by [`plan_eviction`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    /// Entries that stay, in their original order.
    pub keep: Vec<CacheEntry>,
    /// Entries removed by the age sweep.
    pub expired: Vec<CacheEntry>,
    /// Entries removed by the size sweep, oldest-cached first.
    pub oversized: Vec<CacheEntry>,
}

impl EvictionPlan {
    /// Total size of the kept entries.
    #[must_use]
    pub fn kept_size(&self) -> u64 {
        self.keep.iter().map(|e| e.size).sum()
    }

    /// Every entry the plan removes.
    pub fn evicted(&self) -> impl Iterator<Item = &CacheEntry> {
        self.expired.iter().chain(self.oversized.iter())
    }

    /// Whether the plan removes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.expired.is_empty() && self.oversized.is_empty()
    }
}

/// Splits `entries` into kept and evicted sets.
///
/// Age sweep: every entry at least `max_age` old goes, regardless of size.
/// Size sweep: if the survivors still exceed `max_size`, drop them in
/// `cached_at` order (ties keep insertion order) until the total fits.
#[must_use]
pub fn plan_eviction(
    entries: Vec<CacheEntry>,
    now: DateTime<Utc>,
    max_age: Duration,
    max_size: u64,
) -> EvictionPlan {
    let (mut live, expired): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|e| e.is_live(now, max_age));

    let mut total: u64 = live.iter().map(|e| e.size).sum();
    if total <= max_size {
        return EvictionPlan {
            keep: live,
            expired,
            oversized: Vec::new(),
        };
    }

    // Rank by creation time to pick victims, but keep survivors in ledger order.
    let mut order: Vec<usize> = (0..live.len()).collect();
    order.sort_by_key(|&i| live[i].cached_at);

    let mut evict = vec![false; live.len()];
    for i in order {
        if total <= max_size {
            break;
        }
        total -= live[i].size;
        evict[i] = true;
    }

    let mut oversized: Vec<(usize, CacheEntry)> = Vec::new();
    let mut keep = Vec::with_capacity(live.len());
    for (i, entry) in live.drain(..).enumerate() {
        if evict[i] {
            oversized.push((i, entry));
        } else {
            keep.push(entry);
        }
    }
    oversized.sort_by(|(ia, a), (ib, b)| a.cached_at.cmp(&b.cached_at).then(ia.cmp(ib)));

    EvictionPlan {
        keep,
        expired,
        oversized: oversized.into_iter().map(|(_, e)| e).collect(),
    }
}
