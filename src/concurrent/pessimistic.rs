//! Single-lock cache discipline.
//!
//! Every operation, reads included, runs under one `parking_lot::Mutex`.
//! Policies whose lookups reorder the store (LRU promotes on every hit) need
//! this: a hit is a structural write.

use crate::cache::{notify, Cache, RemovalListener};
use crate::cache_core::CacheCore;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::entry::EntrySnapshot;
use crate::error::CacheError;
use crate::iter::SnapshotIter;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::policy::EvictionPolicy;
use crate::pruner::{BackgroundPruner, PruneSchedule};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// A cache guarded by a single mutual-exclusion lock.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone + Send + Sync`.
/// - `V`: Value type. Must implement `Clone + Send + Sync`.
/// - `P`: Eviction policy; see [`LruCache`](crate::LruCache),
///   [`LfuCache`](crate::LfuCache) and
///   [`PessimisticTimedCache`](crate::PessimisticTimedCache).
pub struct PessimisticCache<K, V, P> {
    core: Mutex<CacheCore<K, V, P>>,
    listener: Option<RemovalListener<K, V>>,
    schedule: PruneSchedule,
}

impl<K, V, P> PessimisticCache<K, V, P>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy<K, V>,
{
    /// Creates a cache reading time from the system clock.
    pub fn init(config: CacheConfig, listener: Option<RemovalListener<K, V>>) -> Self {
        Self::init_with_clock(config, listener, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn init_with_clock(
        config: CacheConfig,
        listener: Option<RemovalListener<K, V>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            core: Mutex::new(CacheCore::new(config, clock)),
            listener,
            schedule: PruneSchedule::default(),
        }
    }

    /// Current counters and size.
    pub fn core_metrics(&self) -> CoreCacheMetrics {
        self.core.lock().metrics()
    }

    /// Prunes this cache every `delay` on `pruner`, replacing any earlier
    /// schedule. The schedule ends when the cache is dropped.
    ///
    /// # Errors
    ///
    /// Whatever the pruner reports, such as [`CacheError::PrunerStopped`].
    pub fn schedule_prune(
        self: &Arc<Self>,
        pruner: Arc<dyn BackgroundPruner>,
        delay: Duration,
    ) -> Result<(), CacheError>
    where
        K: 'static,
        V: 'static,
    {
        self.schedule.start(self, pruner, delay, |cache: &Self| {
            cache.prune();
        })
    }

    /// Cancels a schedule set up by [`schedule_prune`](Self::schedule_prune).
    /// Returns `false` if none was active.
    pub fn cancel_prune_schedule(&self) -> bool {
        self.schedule.cancel()
    }
}

impl<K, V, P> Cache<K, V> for PessimisticCache<K, V, P>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy<K, V>,
{
    fn capacity(&self) -> usize {
        self.core.lock().capacity()
    }

    fn timeout(&self) -> Duration {
        self.core.lock().default_ttl()
    }

    fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut removed = Vec::new();
        self.core.lock().insert(key, value, ttl, &mut removed);
        notify(self.listener.as_ref(), removed);
    }

    fn get_with_access(&self, key: &K, update_last_access: bool) -> Option<V> {
        let mut removed = Vec::new();
        let value = self.core.lock().lookup_mut(key, update_last_access, &mut removed);
        notify(self.listener.as_ref(), removed);
        value
    }

    fn insert_if_absent(&self, key: K, value: V, ttl: Duration, update_last_access: bool) -> V {
        let mut removed = Vec::new();
        let value = self
            .core
            .lock()
            .insert_if_absent(key, value, ttl, update_last_access, &mut removed);
        notify(self.listener.as_ref(), removed);
        value
    }

    fn contains_key(&self, key: &K) -> bool {
        self.core.lock().contains_live(key)
    }

    fn remove(&self, key: &K) -> Option<V> {
        let (removed, live) = self.core.lock().remove(key)?;
        let value = live.then(|| removed.value.clone());
        notify(self.listener.as_ref(), vec![removed]);
        value
    }

    fn clear(&self) {
        self.core.lock().clear();
    }

    fn prune(&self) -> usize {
        let mut removed = Vec::new();
        let count = self.core.lock().prune(&mut removed);
        notify(self.listener.as_ref(), removed);
        count
    }

    fn len(&self) -> usize {
        self.core.lock().len()
    }

    fn is_full(&self) -> bool {
        self.core.lock().is_full()
    }

    fn hit_count(&self) -> u64 {
        self.core.lock().hits()
    }

    fn miss_count(&self) -> u64 {
        self.core.lock().misses()
    }

    fn iter(&self) -> SnapshotIter<V> {
        SnapshotIter::from_vec(self.core.lock().values())
    }

    fn entries(&self) -> SnapshotIter<EntrySnapshot<K, V>> {
        SnapshotIter::from_vec(self.core.lock().entries())
    }
}

impl<K, V, P> CacheMetrics for PessimisticCache<K, V, P>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy<K, V>,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.core_metrics().to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        P::NAME
    }
}

impl<K, V, P> fmt::Debug for PessimisticCache<K, V, P>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("PessimisticCache")
            .field("policy", &P::NAME)
            .field("len", &core.len())
            .field("capacity", &core.capacity())
            .field("timeout", &core.default_ttl())
            .finish()
    }
}
