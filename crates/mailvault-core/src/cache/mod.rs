//! Size- and age-bounded bookkeeping of cached storage.
//!
//! Each account owns one [`CacheLedger`] whose record lives at
//! `{account}/cache/cache_metadata.yaml`. Stores register what they write;
//! the ledger decides what to evict.

mod eviction;
mod ledger;
mod model;

pub use eviction::{EvictionPlan, plan_eviction};
pub use ledger::{CacheLedger, DEFAULT_MAX_AGE_HOURS};
pub use model::{CacheEntry, CacheStats, EntryKind, EvictionSummary, LEDGER_VERSION, LedgerRecord};
