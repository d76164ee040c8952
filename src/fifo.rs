//! First In, First Out Cache
//!
//! A capacity-bounded cache that evicts the oldest insertion. It tracks no
//! recency: re-putting a key replaces its value but keeps its place in line,
//! and hits never reorder anything, so reads run under a shared lock.
//!
//! # How It Works
//!
//! ```text
//!   put a, b, c (capacity 2)      prune()
//!   ┌───┬───┬───┐                 ┌───┬───┐
//!   │ a │ b │ c │       ──▶       │ b │ c │     a evicted
//!   └───┴───┴───┘                 └───┴───┘
//!   oldest    newest
//! ```
//!
//! A prune walks the entries once, removing every expired entry and
//! remembering the oldest survivor. If the cache is still full afterwards,
//! that survivor is evicted.
//!
//! Pruning also runs when a new key is put into a cache that already holds
//! more than `capacity` entries, so the cache never grows beyond one entry
//! over capacity between prunes.
//!
//! # Example
//!
//! ```
//! use tidecache::{Cache, FifoCache};
//! use std::time::Duration;
//!
//! let cache = FifoCache::new(2, Duration::ZERO);
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a"); // hits do not protect "a"
//! cache.put("c", 3);
//!
//! assert!(cache.is_full());
//! assert_eq!(cache.prune(), 1);
//! assert!(!cache.contains_key(&"a"));
//! ```

use crate::concurrent::OptimisticCache;
use crate::config::CacheConfig;
use crate::policy::{self, EvictionPolicy, PruneContext, Removed};
use crate::store::{LinkedStore, StoreOrder};
use std::hash::Hash;
use std::time::Duration;

/// FIFO eviction over an insertion-ordered store.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fifo;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Fifo {
    const NAME: &'static str = "FIFO";
    const ORDER: StoreOrder = StoreOrder::Insertion;
    const BOUNDED: bool = true;

    fn prune(&self, store: &mut LinkedStore<K, V>, ctx: &PruneContext, removed: &mut Vec<Removed<K, V>>) {
        policy::prune_expired_then_first(store, ctx, removed);
    }
}

/// A bounded first-in, first-out cache with optimistic reads.
pub type FifoCache<K, V> = OptimisticCache<K, V, Fifo>;

impl<K, V> OptimisticCache<K, V, Fifo>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a FIFO cache holding up to `capacity` entries (zero for no
    /// limit) whose entries expire after `default_ttl` (zero for never).
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::init(CacheConfig::new(capacity).with_default_ttl(default_ttl), None)
    }
}
