//! Least Recently Used (LRU) Cache
//!
//! The LRU cache keeps its entries in order of recency of use and, when a prune
//! finds it full, evicts the entry that was used least recently. This works on
//! the principle of temporal locality: entries that were accessed recently are
//! likely to be accessed again soon.
//!
//! # Algorithm
//!
//! The pruning algorithm is the same as FIFO's (drop expired entries, then the
//! first survivor if still full). The difference is the store: it is
//! access-ordered, so every hit and every re-put moves the entry to the back,
//! and the first survivor is the least recently used entry.
//!
//! # Thread Safety
//!
//! Because a hit reorders the store, lookups need exclusive access. `LruCache`
//! is therefore a [`PessimisticCache`]; every operation takes its mutex.
//!
//! # When to Use
//!
//! LRU caches are ideal for:
//! - General-purpose caching where access patterns exhibit temporal locality
//! - Caching with a fixed entry budget
//!
//! They are less suitable for:
//! - Workloads where frequency of access matters more than recency
//!   (see [`LfuCache`](crate::LfuCache))
//! - Read-heavy workloads with many threads, where the single lock contends
//!
//! # Example
//!
//! ```
//! use tidecache::{Cache, LruCache};
//! use std::time::Duration;
//!
//! let cache = LruCache::new(2, Duration::ZERO);
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");      // "a" becomes most recently used
//! cache.put("c", 3);
//! cache.prune();        // "b" evicted (least recently used)
//! assert!(cache.get(&"b").is_none());
//! assert_eq!(cache.get(&"a"), Some(1));
//! ```

use crate::concurrent::PessimisticCache;
use crate::config::CacheConfig;
use crate::policy::{self, EvictionPolicy, PruneContext, Removed};
use crate::store::{LinkedStore, StoreOrder};
use std::hash::Hash;
use std::time::Duration;

/// LRU eviction over an access-ordered store.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lru;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Lru {
    const NAME: &'static str = "LRU";
    const ORDER: StoreOrder = StoreOrder::Access;
    const BOUNDED: bool = true;

    fn prune(&self, store: &mut LinkedStore<K, V>, ctx: &PruneContext, removed: &mut Vec<Removed<K, V>>) {
        policy::prune_expired_then_first(store, ctx, removed);
    }
}

/// A bounded least-recently-used cache under a single lock.
pub type LruCache<K, V> = PessimisticCache<K, V, Lru>;

impl<K, V> PessimisticCache<K, V, Lru>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates an LRU cache holding up to `capacity` entries (zero for no
    /// limit) whose entries expire after `default_ttl` (zero for never).
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::init(CacheConfig::new(capacity).with_default_ttl(default_ttl), None)
    }
}
