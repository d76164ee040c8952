//! Unbounded Timed Cache
//!
//! Expiry is the only reason an entry leaves a timed cache: there is no
//! capacity, and a configured capacity is ignored. Expired entries are removed
//! lazily when a lookup finds them, and in bulk by `prune`, which is usually
//! driven by a [`BackgroundPruner`](crate::pruner::BackgroundPruner).
//!
//! Two flavors share the policy:
//!
//! | Type | Discipline |
//! |------|------------|
//! | [`TimedCache`] | optimistic reads |
//! | [`PessimisticTimedCache`] | single lock |
//!
//! # Example
//!
//! ```
//! use tidecache::clock::ManualClock;
//! use tidecache::config::CacheConfig;
//! use tidecache::{Cache, TimedCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new());
//! let cache: TimedCache<&str, i32> =
//!     TimedCache::init_with_clock(CacheConfig::timed(Duration::from_millis(50)), None, clock.clone());
//!
//! cache.put("x", 1);
//! clock.advance(Duration::from_millis(60));
//! assert_eq!(cache.get(&"x"), None);
//! assert_eq!(cache.miss_count(), 1);
//! ```

use crate::concurrent::{OptimisticCache, PessimisticCache};
use crate::config::CacheConfig;
use crate::policy::{self, EvictionPolicy, PruneContext, Removed};
use crate::store::{LinkedStore, StoreOrder};
use std::hash::Hash;
use std::time::Duration;

/// Expiry-only pruning over an insertion-ordered store.
#[derive(Debug, Default, Clone, Copy)]
pub struct Timed;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Timed {
    const NAME: &'static str = "Timed";
    const ORDER: StoreOrder = StoreOrder::Insertion;
    const BOUNDED: bool = false;

    fn prune(&self, store: &mut LinkedStore<K, V>, ctx: &PruneContext, removed: &mut Vec<Removed<K, V>>) {
        if ctx.may_expire {
            policy::prune_expired(store, ctx.now, removed);
        }
    }
}

/// An unbounded cache with optimistic reads whose entries leave only by expiry.
pub type TimedCache<K, V> = OptimisticCache<K, V, Timed>;

/// An unbounded cache under a single lock whose entries leave only by expiry.
pub type PessimisticTimedCache<K, V> = PessimisticCache<K, V, Timed>;

impl<K, V> OptimisticCache<K, V, Timed>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a timed cache whose entries expire after `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self::init(CacheConfig::timed(default_ttl), None)
    }
}

impl<K, V> PessimisticCache<K, V, Timed>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a single-lock timed cache whose entries expire after `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self::init(CacheConfig::timed(default_ttl), None)
    }
}
