//! Cache Entry Type
//!
//! This module provides the `CacheEntry<K, V>` structure stored by every cache
//! policy, and `EntrySnapshot<K, V>`, the owned copy handed out by entry
//! iteration.
//!
//! # Expiry
//!
//! An entry carries its own time-to-live in milliseconds. A ttl of zero means
//! the entry never expires. An entry is expired once more than `ttl`
//! milliseconds have passed since its *reference time*, which is the last
//! access time. Caches configured with [`ExpiryMode::Fixed`] never refresh the
//! access time on reads, so for them the reference time is the creation time.
//!
//! # Memory Layout
//!
//! Each entry has the following overhead:
//! - `key: K` - User's key type
//! - `value: V` - User's value type
//! - `ttl: u64` - 8 bytes
//! - `create_time: u64` - 8 bytes
//! - `last_accessed: AtomicU64` - 8 bytes
//! - `access_count: AtomicU64` - 8 bytes
//!
//! # Thread Safety
//!
//! `last_accessed` and `access_count` are atomics so that readers holding only
//! a shared lock can record an access without upgrading to a write lock.
//!
//! [`ExpiryMode::Fixed`]: crate::config::ExpiryMode::Fixed

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A cached value together with its key, timestamps and time-to-live.
///
/// # Examples
///
/// ```
/// use tidecache::entry::CacheEntry;
///
/// let entry = CacheEntry::new("key", 42, 100, 1_000);
/// assert!(!entry.is_expired(1_100));
/// assert!(entry.is_expired(1_101));
/// ```
pub struct CacheEntry<K, V> {
    key: K,
    value: V,

    /// Time-to-live in milliseconds. Zero never expires.
    ttl: u64,

    /// Creation timestamp in clock milliseconds.
    create_time: u64,

    /// Last access timestamp in clock milliseconds.
    last_accessed: AtomicU64,

    /// Number of hits served by this entry.
    access_count: AtomicU64,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates an entry created and last accessed at `now`.
    #[inline]
    pub fn new(key: K, value: V, ttl_millis: u64, now: u64) -> Self {
        Self {
            key,
            value,
            ttl: ttl_millis,
            create_time: now,
            last_accessed: AtomicU64::new(now),
            access_count: AtomicU64::new(0),
        }
    }

    /// The entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Reads the value without touching access time or count.
    #[inline]
    pub fn peek(&self) -> &V {
        &self.value
    }

    /// Reads the value as a cache hit.
    ///
    /// Always bumps the access count; refreshes the last access time only
    /// when `update_access` is set.
    #[inline]
    pub fn value(&self, update_access: bool, now: u64) -> &V {
        if update_access {
            self.touch(now);
        }
        self.access_count.fetch_add(1, Ordering::Relaxed);
        &self.value
    }

    /// Sets the last access time to `now`.
    #[inline]
    pub fn touch(&self, now: u64) {
        self.last_accessed.store(now, Ordering::Relaxed);
    }

    /// Whether the entry has outlived its ttl at `now`. Never true for ttl 0.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.ttl > 0 && now.saturating_sub(self.last_accessed()) > self.ttl
    }

    /// Time-to-live in milliseconds.
    #[inline]
    pub fn ttl_millis(&self) -> u64 {
        self.ttl
    }

    /// Creation timestamp in clock milliseconds.
    #[inline]
    pub fn create_time(&self) -> u64 {
        self.create_time
    }

    /// Last access timestamp in clock milliseconds.
    #[inline]
    pub fn last_accessed(&self) -> u64 {
        self.last_accessed.load(Ordering::Relaxed)
    }

    /// Number of hits recorded so far.
    #[inline]
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    /// Lowers the access count by `by`, saturating at zero, and returns the new count.
    pub(crate) fn decay_access_count(&self, by: u64) -> u64 {
        let current = self.access_count();
        let decayed = current.saturating_sub(by);
        self.access_count.store(decayed, Ordering::Relaxed);
        decayed
    }

    /// Splits the entry into its key and value.
    #[inline]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: Clone, V: Clone> CacheEntry<K, V> {
    /// Copies the entry's observable state.
    pub fn snapshot(&self) -> EntrySnapshot<K, V> {
        EntrySnapshot {
            key: self.key.clone(),
            value: self.value.clone(),
            ttl: Duration::from_millis(self.ttl),
            created_at: self.create_time,
            last_accessed: self.last_accessed(),
            access_count: self.access_count(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("ttl", &self.ttl)
            .field("create_time", &self.create_time)
            .field("last_accessed", &self.last_accessed())
            .field("access_count", &self.access_count())
            .finish()
    }
}

/// An owned, point-in-time copy of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot<K, V> {
    /// The entry's key.
    pub key: K,
    /// The entry's value.
    pub value: V,
    /// Time-to-live; zero never expires.
    pub ttl: Duration,
    /// Creation timestamp in clock milliseconds.
    pub created_at: u64,
    /// Last access timestamp in clock milliseconds.
    pub last_accessed: u64,
    /// Hits served by the entry when the snapshot was taken.
    pub access_count: u64,
}

impl<K, V> EntrySnapshot<K, V> {
    /// Clock reading after which the entry counts as expired, unless it is
    /// accessed again first. `None` when the entry never expires.
    pub fn expires_after(&self) -> Option<u64> {
        if self.ttl.is_zero() {
            None
        } else {
            Some(self.last_accessed.saturating_add(crate::clock::ttl_millis(self.ttl)))
        }
    }

    /// Converts the key, dropping the snapshot when the conversion yields nothing.
    pub fn filter_map_key<K2>(self, f: impl FnOnce(K) -> Option<K2>) -> Option<EntrySnapshot<K2, V>> {
        Some(EntrySnapshot {
            key: f(self.key)?,
            value: self.value,
            ttl: self.ttl,
            created_at: self.created_at,
            last_accessed: self.last_accessed,
            access_count: self.access_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry() {
        let entry = CacheEntry::new("key", 42, 0, 10);
        assert_eq!(*entry.key(), "key");
        assert_eq!(*entry.peek(), 42);
        assert_eq!(entry.create_time(), 10);
        assert_eq!(entry.last_accessed(), 10);
        assert_eq!(entry.access_count(), 0);
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let entry = CacheEntry::new("key", 1, 0, 0);
        assert!(!entry.is_expired(u64::MAX));
    }

    #[test]
    fn test_expiry_is_strictly_after_ttl() {
        let entry = CacheEntry::new("key", 1, 50, 100);
        assert!(!entry.is_expired(150));
        assert!(entry.is_expired(151));
    }

    #[test]
    fn test_value_with_access_update_slides_expiry() {
        let entry = CacheEntry::new("key", 1, 50, 0);
        assert_eq!(*entry.value(true, 40), 1);
        assert_eq!(entry.last_accessed(), 40);
        assert!(!entry.is_expired(90));
        assert!(entry.is_expired(91));
    }

    #[test]
    fn test_value_without_access_update_keeps_reference_time() {
        let entry = CacheEntry::new("key", 1, 50, 0);
        entry.value(false, 40);
        assert_eq!(entry.last_accessed(), 0);
        assert!(entry.is_expired(51));
        assert_eq!(entry.access_count(), 1);
    }

    #[test]
    fn test_decay_access_count_saturates() {
        let entry = CacheEntry::new("key", 1, 0, 0);
        entry.value(false, 0);
        entry.value(false, 0);
        assert_eq!(entry.decay_access_count(1), 1);
        assert_eq!(entry.decay_access_count(5), 0);
    }

    #[test]
    fn test_snapshot_and_expires_after() {
        let entry = CacheEntry::new("key", "v".to_string(), 30, 5);
        let snap = entry.snapshot();
        assert_eq!(snap.key, "key");
        assert_eq!(snap.value, "v");
        assert_eq!(snap.ttl, Duration::from_millis(30));
        assert_eq!(snap.expires_after(), Some(35));

        let forever = CacheEntry::new("k", 0, 0, 5).snapshot();
        assert_eq!(forever.expires_after(), None);
    }

    #[test]
    fn test_filter_map_key() {
        let snap = CacheEntry::new(3u32, "v", 0, 0).snapshot();
        let mapped = snap.clone().filter_map_key(|k| Some(k * 2)).unwrap();
        assert_eq!(mapped.key, 6);
        assert!(snap.filter_map_key(|_| None::<u32>).is_none());
    }

    #[test]
    fn test_debug_impl() {
        let entry = CacheEntry::new("key", 42, 0, 0);
        let debug_str = format!("{:?}", entry);
        assert!(debug_str.contains("CacheEntry"));
        assert!(debug_str.contains("key"));
        assert!(debug_str.contains("42"));
    }
}
