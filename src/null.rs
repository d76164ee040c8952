//! A cache that stores nothing.
//!
//! `NullCache` implements the whole [`Cache`] contract as a no-op, so caching
//! can be switched off through configuration without touching call sites:
//! puts are dropped, lookups miss, and a get-or-insert always runs its
//! supplier and hands the result straight back.
//!
//! ```
//! use tidecache::{Cache, CacheExt, NullCache};
//!
//! let cache: NullCache<&str, u32> = NullCache::new();
//! cache.put("a", 1);
//! assert_eq!(cache.get(&"a"), None);
//!
//! let mut calls = 0;
//! for _ in 0..3 {
//!     let value = cache.get_or_insert_with("a", || {
//!         calls += 1;
//!         7
//!     });
//!     assert_eq!(value, 7);
//! }
//! assert_eq!(calls, 3);
//! assert!(cache.is_empty());
//! ```

use crate::cache::Cache;
use crate::entry::EntrySnapshot;
use crate::iter::SnapshotIter;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

/// The no-op cache.
pub struct NullCache<K, V> {
    _marker: PhantomData<fn(K, V)>,
}

impl<K, V> NullCache<K, V> {
    /// Creates the cache.
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<K, V> Default for NullCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for NullCache<K, V> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for NullCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NullCache")
    }
}

impl<K, V> Cache<K, V> for NullCache<K, V> {
    fn capacity(&self) -> usize {
        0
    }

    fn timeout(&self) -> Duration {
        Duration::ZERO
    }

    fn put_with_ttl(&self, _key: K, _value: V, _ttl: Duration) {}

    fn get_with_access(&self, _key: &K, _update_last_access: bool) -> Option<V> {
        None
    }

    fn insert_if_absent(&self, _key: K, value: V, _ttl: Duration, _update_last_access: bool) -> V {
        value
    }

    fn contains_key(&self, _key: &K) -> bool {
        false
    }

    fn remove(&self, _key: &K) -> Option<V> {
        None
    }

    fn clear(&self) {}

    fn prune(&self) -> usize {
        0
    }

    fn len(&self) -> usize {
        0
    }

    fn is_full(&self) -> bool {
        false
    }

    fn hit_count(&self) -> u64 {
        0
    }

    fn miss_count(&self) -> u64 {
        0
    }

    fn iter(&self) -> SnapshotIter<V> {
        SnapshotIter::empty()
    }

    fn entries(&self) -> SnapshotIter<EntrySnapshot<K, V>> {
        SnapshotIter::empty()
    }
}

impl<K, V> CacheMetrics for NullCache<K, V> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        CoreCacheMetrics::default().to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "None"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;

    #[test]
    fn test_null_cache_is_inert() {
        let cache: NullCache<u32, String> = NullCache::new();
        cache.put(1, "one".to_string());
        cache.put_with_ttl(2, "two".to_string(), Duration::from_secs(1));

        assert_eq!(cache.get(&1), None);
        assert!(!cache.contains_key(&2));
        assert_eq!(cache.remove(&1), None);
        assert_eq!(cache.prune(), 0);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert!(!cache.is_full());
        assert_eq!(cache.iter().next(), None);
        assert_eq!(cache.entries().count(), 0);
        assert_eq!((cache.hit_count(), cache.miss_count()), (0, 0));
    }

    #[test]
    fn test_null_cache_supplier_errors_propagate() {
        let cache: NullCache<u32, u32> = NullCache::default();
        let result: Result<u32, &str> = cache.try_get_or_insert_with(1, true, Duration::ZERO, || Err("down"));
        assert_eq!(result, Err("down"));
    }

    #[test]
    fn test_null_cache_metrics() {
        let cache: NullCache<u8, u8> = NullCache::new();
        assert_eq!(cache.algorithm_name(), "None");
        assert_eq!(cache.metrics()["size"], 0.0);
    }
}
