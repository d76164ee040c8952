//! Weak-Key Cache
//!
//! A timed cache whose keys are held through [`Weak`] references. Callers keep
//! their keys alive with `Arc`s; once the last strong reference to a key is
//! dropped, its entry can no longer be found and the next prune removes it.
//!
//! ```text
//!   caller: Arc<K> ──strong──▶ K ◀──weak── WeakKey { hash, Weak<K> } ──▶ entry
//!
//!   drop(Arc<K>)  ──▶  lookups miss  ──▶  prune(): cause Reclaimed
//!                                         listener(None, value)
//! ```
//!
//! Reclaimed entries are purged by `prune`, and every so often by `put` (see
//! [`WeakTimed`]). Schedule a background prune (see
//! [`WeakKeyCache::schedule_prune`]) to bound how long their values stay in
//! memory when the cache is rarely written. By the time a reclaimed entry is purged its key is gone, so the
//! removal listener receives `None` in place of the key. Entries removed
//! through `remove` or expiry while their key is still alive receive
//! `Some(key)`.
//!
//! Apart from reclamation the cache behaves exactly like
//! [`TimedCache`](crate::TimedCache): it is unbounded and entries also expire
//! by ttl.
//!
//! # Example
//!
//! ```
//! use tidecache::{Cache, WeakKeyCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cache: WeakKeyCache<String, u32> = WeakKeyCache::new(Duration::ZERO);
//! let session = Arc::new("session-1".to_string());
//! cache.put(session.clone(), 42);
//! assert_eq!(cache.get(&session), Some(42));
//!
//! drop(session);
//! assert_eq!(cache.prune(), 1);
//! assert!(cache.is_empty());
//! ```

use crate::cache::{Cache, RemovalListener};
use crate::clock::{Clock, SystemClock};
use crate::concurrent::OptimisticCache;
use crate::config::CacheConfig;
use crate::entry::EntrySnapshot;
use crate::error::CacheError;
use crate::iter::SnapshotIter;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::policy::{EvictionPolicy, PruneContext, RemovalCause, Removed};
use crate::pruner::BackgroundPruner;
use crate::store::{LinkedStore, StoreOrder};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, Weak};
use std::time::Duration;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// Listener for a [`WeakKeyCache`]. The key is `None` when the entry was
/// purged because its key had already been dropped.
pub type WeakRemovalListener<K, V> = Arc<dyn Fn(Option<Arc<K>>, V) + Send + Sync>;

/// A key held through a weak reference.
///
/// The hash is computed once from the key's value, so a reclaimed key still
/// hashes consistently. Two keys are equal if they point at the same
/// allocation, or if both are alive and their values are equal.
///
/// Comparing keys upgrades them for the duration of the comparison. If the
/// caller drops its last `Arc` meanwhile, the key is destroyed by the cache,
/// possibly while the cache lock is held, so `K`'s `Drop` must not call back
/// into the same cache.
pub struct WeakKey<K> {
    hash: u64,
    key: Weak<K>,
}

impl<K> WeakKey<K> {
    fn new<S: BuildHasher>(key: &Arc<K>, hasher: &S) -> Self
    where
        K: Hash,
    {
        Self {
            hash: hasher.hash_one(&**key),
            key: Arc::downgrade(key),
        }
    }

    /// The key, if it is still alive.
    pub fn upgrade(&self) -> Option<Arc<K>> {
        self.key.upgrade()
    }

    /// Whether every strong reference to the key has been dropped.
    pub fn is_reclaimed(&self) -> bool {
        self.key.strong_count() == 0
    }
}

impl<K> Clone for WeakKey<K> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            key: Weak::clone(&self.key),
        }
    }
}

impl<K> Hash for WeakKey<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<K: Eq> PartialEq for WeakKey<K> {
    // The upgraded Arcs may be the last strong references; see the type docs.
    fn eq(&self, other: &Self) -> bool {
        if Weak::ptr_eq(&self.key, &other.key) {
            return true;
        }
        match (self.key.upgrade(), other.key.upgrade()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl<K: Eq> Eq for WeakKey<K> {}

impl<K: fmt::Debug> fmt::Debug for WeakKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakKey")
            .field("hash", &self.hash)
            .field("key", &self.upgrade())
            .finish()
    }
}

/// Expiry pruning that also purges entries whose key was reclaimed.
///
/// Writes purge reclaimed entries too, once every [`PURGE_INTERVAL`] writes
/// or every `len / 2` writes when the cache is larger, so a cache that is
/// only ever written to stays proportional to its live keys.
///
/// [`PURGE_INTERVAL`]: WeakTimed::PURGE_INTERVAL
#[derive(Debug, Default, Clone, Copy)]
pub struct WeakTimed {
    writes: usize,
}

impl WeakTimed {
    /// Minimum number of writes between two write-path purges.
    pub const PURGE_INTERVAL: usize = 64;
}

impl<K: Eq, V> EvictionPolicy<WeakKey<K>, V> for WeakTimed {
    const NAME: &'static str = "WeakTimed";
    const ORDER: StoreOrder = StoreOrder::Insertion;
    const BOUNDED: bool = false;

    fn prune(
        &self,
        store: &mut LinkedStore<WeakKey<K>, V>,
        ctx: &PruneContext,
        removed: &mut Vec<Removed<WeakKey<K>, V>>,
    ) {
        let mut cursor = store.cursor();
        while let Some(entry) = cursor.next() {
            let cause = if entry.key().is_reclaimed() {
                RemovalCause::Reclaimed
            } else if ctx.may_expire && entry.is_expired(ctx.now) {
                RemovalCause::Expired
            } else {
                continue;
            };
            if let Some(entry) = cursor.remove() {
                removed.push(Removed::from_entry(entry, cause));
            }
        }
    }

    fn after_write(&mut self, store: &mut LinkedStore<WeakKey<K>, V>, removed: &mut Vec<Removed<WeakKey<K>, V>>) {
        self.writes += 1;
        if self.writes < Self::PURGE_INTERVAL.max(store.len() / 2) {
            return;
        }
        self.writes = 0;

        let mut cursor = store.cursor();
        while let Some(entry) = cursor.next() {
            if !entry.key().is_reclaimed() {
                continue;
            }
            if let Some(entry) = cursor.remove() {
                removed.push(Removed::from_entry(entry, RemovalCause::Reclaimed));
            }
        }
    }
}

/// An unbounded timed cache with weakly held keys.
pub struct WeakKeyCache<K, V> {
    inner: Arc<OptimisticCache<WeakKey<K>, V, WeakTimed>>,
    hasher: DefaultHashBuilder,
}

impl<K, V> WeakKeyCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a weak-key cache whose entries expire after `default_ttl`
    /// (zero for never).
    pub fn new(default_ttl: Duration) -> Self {
        Self::init(CacheConfig::timed(default_ttl), None)
    }

    /// Creates a cache reading time from the system clock.
    pub fn init(config: CacheConfig, listener: Option<WeakRemovalListener<K, V>>) -> Self {
        Self::init_with_clock(config, listener, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn init_with_clock(
        config: CacheConfig,
        listener: Option<WeakRemovalListener<K, V>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let listener = listener.map(|listener| -> RemovalListener<WeakKey<K>, V> {
            Arc::new(move |key: WeakKey<K>, value: V| listener(key.upgrade(), value))
        });
        Self {
            inner: Arc::new(OptimisticCache::init_with_clock(config, listener, clock)),
            hasher: DefaultHashBuilder::default(),
        }
    }

    fn wrap(&self, key: &Arc<K>) -> WeakKey<K> {
        WeakKey::new(key, &self.hasher)
    }

    /// Current counters and size.
    pub fn core_metrics(&self) -> CoreCacheMetrics {
        self.inner.core_metrics()
    }

    /// Prunes this cache every `delay` on `pruner`, replacing any earlier
    /// schedule. The schedule ends when the cache is dropped.
    ///
    /// # Errors
    ///
    /// Whatever the pruner reports, such as [`CacheError::InvalidPruneDelay`].
    pub fn schedule_prune(&self, pruner: Arc<dyn BackgroundPruner>, delay: Duration) -> Result<(), CacheError> {
        self.inner.schedule_prune(pruner, delay)
    }

    /// Cancels a schedule set up by [`schedule_prune`](Self::schedule_prune).
    /// Returns `false` if none was active.
    pub fn cancel_prune_schedule(&self) -> bool {
        self.inner.cancel_prune_schedule()
    }
}

impl<K, V> Cache<Arc<K>, V> for WeakKeyCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn capacity(&self) -> usize {
        0
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    fn put_with_ttl(&self, key: Arc<K>, value: V, ttl: Duration) {
        self.inner.put_with_ttl(self.wrap(&key), value, ttl);
    }

    fn get_with_access(&self, key: &Arc<K>, update_last_access: bool) -> Option<V> {
        self.inner.get_with_access(&self.wrap(key), update_last_access)
    }

    fn insert_if_absent(&self, key: Arc<K>, value: V, ttl: Duration, update_last_access: bool) -> V {
        self.inner
            .insert_if_absent(self.wrap(&key), value, ttl, update_last_access)
    }

    fn contains_key(&self, key: &Arc<K>) -> bool {
        self.inner.contains_key(&self.wrap(key))
    }

    fn remove(&self, key: &Arc<K>) -> Option<V> {
        self.inner.remove(&self.wrap(key))
    }

    fn clear(&self) {
        self.inner.clear();
    }

    fn prune(&self) -> usize {
        self.inner.prune()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn is_full(&self) -> bool {
        false
    }

    fn hit_count(&self) -> u64 {
        self.inner.hit_count()
    }

    fn miss_count(&self) -> u64 {
        self.inner.miss_count()
    }

    fn iter(&self) -> SnapshotIter<V> {
        self.inner.iter()
    }

    /// Live entries whose keys are still alive.
    fn entries(&self) -> SnapshotIter<EntrySnapshot<Arc<K>, V>> {
        SnapshotIter::new(
            self.inner
                .entries()
                .filter_map(|entry| entry.filter_map_key(|key| key.upgrade())),
        )
    }
}

impl<K, V> CacheMetrics for WeakKeyCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        self.inner.algorithm_name()
    }
}

impl<K, V> fmt::Debug for WeakKeyCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakKeyCache")
            .field("len", &self.inner.len())
            .field("timeout", &self.inner.timeout())
            .finish()
    }
}
