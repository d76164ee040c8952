//! Optimistic-read cache discipline.
//!
//! Reads try to take the shared side of a `parking_lot::RwLock` without waiting.
//! If a writer holds the lock or is queued for it, the attempt fails and the
//! read falls back to a blocking shared acquisition. Readers never change the
//! structure of the store: the access time and access count they record are
//! atomics inside each entry. Writes always take the exclusive side.
//!
//! ```text
//!   get ──▶ try_read ──ok──▶ lookup ──▶ Hit / Miss
//!              │                 │
//!            busy             Expired
//!              ▼                 ▼
//!            read ──▶ lookup   write ──▶ lookup_mut (re-check, unlink)
//! ```
//!
//! Only policies over an insertion-ordered store are sound here; an
//! access-ordered store reorders on every hit and needs
//! [`PessimisticCache`](super::PessimisticCache).

use crate::cache::{notify, Cache, RemovalListener};
use crate::cache_core::{CacheCore, Lookup};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::entry::EntrySnapshot;
use crate::error::CacheError;
use crate::iter::SnapshotIter;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::policy::EvictionPolicy;
use crate::pruner::{BackgroundPruner, PruneSchedule};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// A cache whose reads run concurrently and whose writes are exclusive.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone + Send + Sync`.
/// - `V`: Value type. Must implement `Clone + Send + Sync`.
/// - `P`: Eviction policy; see [`FifoCache`](crate::FifoCache) and
///   [`TimedCache`](crate::TimedCache).
pub struct OptimisticCache<K, V, P> {
    core: RwLock<CacheCore<K, V, P>>,
    listener: Option<RemovalListener<K, V>>,
    schedule: PruneSchedule,
}

impl<K, V, P> OptimisticCache<K, V, P>
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
            core: RwLock::new(CacheCore::new(config, clock)),
            listener,
            schedule: PruneSchedule::default(),
        }
    }

    fn read_core(&self) -> RwLockReadGuard<'_, CacheCore<K, V, P>> {
        match self.core.try_read() {
            Some(guard) => guard,
            None => self.core.read(),
        }
    }

    /// Current counters and size.
    pub fn core_metrics(&self) -> CoreCacheMetrics {
        self.read_core().metrics()
    }

    /// Prunes this cache every `delay` on `pruner`, replacing any earlier
    /// schedule. The schedule ends when the cache is dropped.
    ///
    /// # Errors
    ///
    /// Whatever the pruner reports, such as [`CacheError::InvalidPruneDelay`].
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

impl<K, V, P> Cache<K, V> for OptimisticCache<K, V, P>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy<K, V>,
{
    fn capacity(&self) -> usize {
        self.read_core().capacity()
    }

    fn timeout(&self) -> Duration {
        self.read_core().default_ttl()
    }

    fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut removed = Vec::new();
        self.core.write().insert(key, value, ttl, &mut removed);
        notify(self.listener.as_ref(), removed);
    }

    fn get_with_access(&self, key: &K, update_last_access: bool) -> Option<V> {
        let lookup = self.read_core().lookup(key, update_last_access);
        match lookup {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
            Lookup::Expired => {
                let mut removed = Vec::new();
                let value = self.core.write().lookup_mut(key, update_last_access, &mut removed);
                notify(self.listener.as_ref(), removed);
                value
            }
        }
    }

    fn insert_if_absent(&self, key: K, value: V, ttl: Duration, update_last_access: bool) -> V {
        let mut removed = Vec::new();
        let value = self
            .core
            .write()
            .insert_if_absent(key, value, ttl, update_last_access, &mut removed);
        notify(self.listener.as_ref(), removed);
        value
    }

    fn contains_key(&self, key: &K) -> bool {
        self.read_core().contains_live(key)
    }

    fn remove(&self, key: &K) -> Option<V> {
        let (removed, live) = self.core.write().remove(key)?;
        let value = live.then(|| removed.value.clone());
        notify(self.listener.as_ref(), vec![removed]);
        value
    }

    fn clear(&self) {
        self.core.write().clear();
    }

    fn prune(&self) -> usize {
        let mut removed = Vec::new();
        let count = self.core.write().prune(&mut removed);
        notify(self.listener.as_ref(), removed);
        count
    }

    fn len(&self) -> usize {
        self.read_core().len()
    }

    fn is_full(&self) -> bool {
        self.read_core().is_full()
    }

    fn hit_count(&self) -> u64 {
        self.read_core().hits()
    }

    fn miss_count(&self) -> u64 {
        self.read_core().misses()
    }

    fn iter(&self) -> SnapshotIter<V> {
        SnapshotIter::from_vec(self.read_core().values())
    }

    fn entries(&self) -> SnapshotIter<EntrySnapshot<K, V>> {
        SnapshotIter::from_vec(self.read_core().entries())
    }
}

impl<K, V, P> CacheMetrics for OptimisticCache<K, V, P>
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

impl<K, V, P> fmt::Debug for OptimisticCache<K, V, P>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.read_core();
        f.debug_struct("OptimisticCache")
            .field("policy", &P::NAME)
            .field("len", &core.len())
            .field("capacity", &core.capacity())
            .field("timeout", &core.default_ttl())
            .finish()
    }
}
