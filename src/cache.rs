//! The `Cache` contract shared by every policy and discipline.
//!
//! [`Cache`] is object safe, so call sites can hold an
//! `Arc<dyn Cache<K, V>>` and switch policies through configuration (see
//! [`CachePolicy::build`](crate::config::CachePolicy::build)). The generic
//! get-or-insert helpers live on the [`CacheExt`] extension trait, which is
//! implemented for every `Cache`, trait objects included.
//!
//! # Removal notifications
//!
//! A [`RemovalListener`] registered at construction is called with the owned
//! key and value of every entry that leaves the cache through `remove`,
//! `prune`, put-triggered pruning or an expired lookup. `clear` drops entries
//! without notifying. The listener always runs after the entry has been
//! unlinked and after the cache lock has been released, so it may call back
//! into the same cache. A panicking listener is logged and otherwise ignored.

use crate::entry::EntrySnapshot;
use crate::iter::SnapshotIter;
use crate::policy::Removed;
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Callback invoked with each removed entry.
pub type RemovalListener<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;

/// A thread-safe key/value cache.
///
/// Absence is never an error: lookups return `None`, `contains_key` returns
/// `false`, and `prune` returns `0` when there is nothing to do.
///
/// # Examples
///
/// ```
/// use tidecache::{Cache, FifoCache};
/// use std::time::Duration;
///
/// let cache: FifoCache<&str, i32> = FifoCache::new(2, Duration::ZERO);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.put("c", 3);
///
/// assert_eq!(cache.prune(), 1);
/// assert_eq!(cache.get(&"a"), None);
/// assert_eq!(cache.get(&"b"), Some(2));
/// assert_eq!(cache.get(&"c"), Some(3));
/// ```
pub trait Cache<K, V>: Send + Sync {
    /// Configured capacity; zero means unbounded.
    fn capacity(&self) -> usize;

    /// Default ttl applied by [`put`](Self::put); zero never expires.
    fn timeout(&self) -> Duration;

    /// Inserts or overwrites `key` with the default ttl.
    fn put(&self, key: K, value: V) {
        self.put_with_ttl(key, value, Duration::ZERO);
    }

    /// Inserts or overwrites `key`. A zero `ttl` selects the default ttl.
    ///
    /// Overwriting resets the entry's timestamps and does not notify the
    /// removal listener.
    fn put_with_ttl(&self, key: K, value: V, ttl: Duration);

    /// Returns the live value for `key`, refreshing its access time.
    fn get(&self, key: &K) -> Option<V> {
        self.get_with_access(key, true)
    }

    /// Returns the live value for `key`.
    ///
    /// Counts a hit or a miss. An expired entry is removed, reported to the
    /// listener and counted as a miss.
    fn get_with_access(&self, key: &K, update_last_access: bool) -> Option<V>;

    /// Returns the live value for `key` if there is one, otherwise stores
    /// `value` with `ttl` (zero selects the default) and returns it.
    ///
    /// Counts neither hit nor miss.
    fn insert_if_absent(&self, key: K, value: V, ttl: Duration, update_last_access: bool) -> V;

    /// Whether a live entry exists. Counts neither hit nor miss.
    fn contains_key(&self, key: &K) -> bool;

    /// Unlinks `key`, notifying the listener once.
    ///
    /// Returns the value if the entry was still live.
    fn remove(&self, key: &K) -> Option<V>;

    /// Drops every entry without notifying the listener.
    fn clear(&self);

    /// Removes expired entries and, for bounded policies, makes room.
    /// Returns the number of entries removed.
    fn prune(&self) -> usize;

    /// Number of stored entries, including expired ones not yet pruned.
    fn len(&self) -> usize;

    /// Whether no entries are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a bounded cache has reached its capacity. Always `false` for
    /// unbounded caches.
    fn is_full(&self) -> bool;

    /// Lookups that found a live entry.
    fn hit_count(&self) -> u64;

    /// Lookups that found nothing or an expired entry.
    fn miss_count(&self) -> u64;

    /// Point-in-time copy of the live values.
    fn iter(&self) -> SnapshotIter<V>;

    /// Point-in-time copy of the live entries with their metadata.
    fn entries(&self) -> SnapshotIter<EntrySnapshot<K, V>>;
}

/// Get-or-insert helpers for every [`Cache`].
///
/// The supplier always runs without any cache lock held, so it may use the
/// cache itself. If another thread stores a live value for the key while the
/// supplier runs, that value is returned and the supplied one is discarded.
///
/// # Examples
///
/// ```
/// use tidecache::{Cache, CacheExt, TimedCache};
/// use std::time::Duration;
///
/// let cache: TimedCache<u32, String> = TimedCache::new(Duration::from_secs(60));
/// let value = cache.get_or_insert_with(7, || "seven".to_string());
/// assert_eq!(value, "seven");
///
/// let parsed: Result<String, std::num::ParseIntError> =
///     cache.try_get_or_insert_with(8, true, Duration::ZERO, || Ok("8".parse::<u32>()?.to_string()));
/// assert_eq!(parsed.unwrap(), "8");
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CacheExt<K, V>: Cache<K, V> {
    /// Returns the cached value, or computes, stores and returns it.
    fn get_or_insert_with<F>(&self, key: K, supplier: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.get_or_insert_with_ttl(key, true, Duration::ZERO, supplier)
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), with control
    /// over the access-time refresh and the ttl of a newly stored value.
    fn get_or_insert_with_ttl<F>(&self, key: K, update_last_access: bool, ttl: Duration, supplier: F) -> V
    where
        F: FnOnce() -> V,
    {
        match self.try_get_or_insert_with(key, update_last_access, ttl, || Ok::<V, Infallible>(supplier())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`get_or_insert_with_ttl`](Self::get_or_insert_with_ttl) with a
    /// fallible supplier. On error nothing is stored and the error is returned
    /// unchanged.
    fn try_get_or_insert_with<E, F>(
        &self,
        key: K,
        update_last_access: bool,
        ttl: Duration,
        supplier: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get_with_access(&key, update_last_access) {
            return Ok(value);
        }
        let value = supplier()?;
        Ok(self.insert_if_absent(key, value, ttl, update_last_access))
    }
}

impl<K, V, C: Cache<K, V> + ?Sized> CacheExt<K, V> for C {}

/// Delivers removal notifications. Must be called without any cache lock held.
pub(crate) fn notify<K, V>(listener: Option<&RemovalListener<K, V>>, removed: Vec<Removed<K, V>>) {
    let Some(listener) = listener else {
        return;
    };
    for Removed { key, value, cause } in removed {
        if panic::catch_unwind(AssertUnwindSafe(|| listener(key, value))).is_err() {
            warn!(?cause, "cache removal listener panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RemovalCause;
    use parking_lot::Mutex;

    fn removed(key: &'static str, value: i32) -> Removed<&'static str, i32> {
        Removed {
            key,
            value,
            cause: RemovalCause::Explicit,
        }
    }

    #[test]
    fn test_notify_calls_listener_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: RemovalListener<&'static str, i32> = Arc::new(move |k, v| sink.lock().push((k, v)));

        notify(Some(&listener), vec![removed("a", 1), removed("b", 2)]);
        assert_eq!(*seen.lock(), vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn test_notify_survives_panicking_listener() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: RemovalListener<&'static str, i32> = Arc::new(move |k, v| {
            if k == "boom" {
                panic!("listener failure");
            }
            sink.lock().push((k, v));
        });

        notify(Some(&listener), vec![removed("boom", 1), removed("b", 2)]);
        assert_eq!(*seen.lock(), vec![("b", 2)]);
    }

    #[test]
    fn test_notify_without_listener_drops_entries() {
        notify::<&'static str, i32>(None, vec![removed("a", 1)]);
    }
}
