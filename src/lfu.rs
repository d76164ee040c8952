//! Least Frequently Used (LFU) Cache
//!
//! The LFU cache counts the hits each entry serves and, when a prune finds it
//! full, evicts the entries that were used least often. It suits workloads with
//! stable popularity, where a few keys are consistently hot.
//!
//! # Algorithm
//!
//! A prune makes up to two passes over the entries:
//!
//! 1. Remove every expired entry and find the smallest access count among the
//!    survivors.
//! 2. If the cache is still full, subtract that minimum from every survivor's
//!    count and evict the entries whose count reaches zero.
//!
//! The subtraction ages the counts, so an entry that was popular long ago does
//! not keep its advantage forever. Entries that tie for the minimum are evicted
//! together.
//!
//! ```text
//!   counts before:  a:5  b:1  c:3  d:1      min = 1
//!   counts after:   a:4  b:0  c:2  d:0      b, d evicted
//! ```
//!
//! # Thread Safety
//!
//! Counts are atomics and hits do not reorder the store, but the count decay
//! in step 2 must not race with concurrent hits, so `LfuCache` is a
//! [`PessimisticCache`].
//!
//! # Example
//!
//! ```
//! use tidecache::{Cache, LfuCache};
//! use std::time::Duration;
//!
//! let cache = LfuCache::new(2, Duration::ZERO);
//! cache.put("rare", 1);
//! cache.put("popular", 2);
//!
//! for _ in 0..10 {
//!     cache.get(&"popular");
//! }
//! cache.get(&"rare");
//!
//! cache.put("new", 3);
//! cache.prune();   // "new" has never been read
//! assert!(cache.contains_key(&"popular"));
//! assert!(!cache.contains_key(&"new"));
//! ```

use crate::concurrent::PessimisticCache;
use crate::config::CacheConfig;
use crate::iter::ExpiringCursor;
use crate::policy::{EvictionPolicy, PruneContext, RemovalCause, Removed};
use crate::store::{LinkedStore, StoreOrder};
use std::hash::Hash;
use std::time::Duration;

/// LFU eviction with count decay over an insertion-ordered store.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lfu;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Lfu {
    const NAME: &'static str = "LFU";
    const ORDER: StoreOrder = StoreOrder::Insertion;
    const BOUNDED: bool = true;

    fn prune(&self, store: &mut LinkedStore<K, V>, ctx: &PruneContext, removed: &mut Vec<Removed<K, V>>) {
        let mut min_count: Option<u64> = None;
        {
            let mut cursor = store.cursor();
            while let Some(entry) = cursor.next() {
                if ctx.may_expire && entry.is_expired(ctx.now) {
                    if let Some(entry) = cursor.remove() {
                        removed.push(Removed::from_entry(entry, RemovalCause::Expired));
                    }
                    continue;
                }
                let count = entry.access_count();
                min_count = Some(min_count.map_or(count, |min| min.min(count)));
            }
        }

        let Some(min_count) = min_count else {
            return;
        };
        if !ctx.is_full(store.len()) {
            return;
        }

        let mut cursor = ExpiringCursor::new(store.cursor(), ctx.now);
        while let Some(entry) = cursor.next() {
            if entry.decay_access_count(min_count) == 0 {
                if let Some(entry) = cursor.remove() {
                    removed.push(Removed::from_entry(entry, RemovalCause::Evicted));
                }
            }
        }
    }
}

/// A bounded least-frequently-used cache under a single lock.
pub type LfuCache<K, V> = PessimisticCache<K, V, Lfu>;

impl<K, V> PessimisticCache<K, V, Lfu>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates an LFU cache holding up to `capacity` entries (zero for no
    /// limit) whose entries expire after `default_ttl` (zero for never).
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::init(CacheConfig::new(capacity).with_default_ttl(default_ttl), None)
    }
}
