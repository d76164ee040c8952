//! Entry iterators.
//!
//! - [`SnapshotIter`] owns a point-in-time copy of whatever it was built from.
//!   Caches hand it out after releasing their lock, so callers can keep
//!   iterating while other threads mutate the cache.
//! - [`ExpiringIter`] adapts a raw entry iterator so that expired entries are
//!   skipped. Caches use it under a shared lock to fill snapshots.
//! - [`ExpiringCursor`] does the same over a store [`Cursor`] and can unlink the
//!   entry it just yielded. Pruning uses it.

use crate::entry::CacheEntry;
use crate::store::Cursor;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::vec;

/// An iterator over an eagerly copied sequence.
///
/// The source iterator is drained completely at construction time; later
/// changes to the source are not observed.
///
/// # Examples
///
/// ```
/// use tidecache::iter::SnapshotIter;
///
/// let mut source = vec![1, 2, 3];
/// let snapshot = SnapshotIter::new(source.iter().copied());
/// source.push(4);
/// assert_eq!(snapshot.collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
pub struct SnapshotIter<T> {
    inner: vec::IntoIter<T>,
}

impl<T> SnapshotIter<T> {
    /// Drains `source` into a private buffer.
    pub fn new<I: IntoIterator<Item = T>>(source: I) -> Self {
        Self::from_vec(source.into_iter().collect())
    }

    /// Wraps an already collected buffer.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: items.into_iter(),
        }
    }

    /// An iterator that yields nothing.
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T> Iterator for SnapshotIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for SnapshotIter<T> {}

impl<T> FusedIterator for SnapshotIter<T> {}

impl<T> Default for SnapshotIter<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for SnapshotIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotIter")
            .field("remaining", &self.inner.len())
            .finish()
    }
}

/// Skips entries that are expired at a fixed instant.
pub struct ExpiringIter<I> {
    inner: I,
    now: u64,
}

impl<I> ExpiringIter<I> {
    /// Wraps `inner`, judging expiry at clock reading `now`.
    pub fn new(inner: I, now: u64) -> Self {
        Self { inner, now }
    }
}

impl<'a, K: 'a, V: 'a, I> Iterator for ExpiringIter<I>
where
    I: Iterator<Item = &'a CacheEntry<K, V>>,
{
    type Item = &'a CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let now = self.now;
        self.inner.by_ref().find(|entry| !entry.is_expired(now))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

/// A store cursor that only stops at live entries.
///
/// Like the underlying [`Cursor`], the entry returned by `next` can be unlinked
/// with `remove`. Expired entries are passed over, not removed.
pub struct ExpiringCursor<'a, K, V> {
    inner: Cursor<'a, K, V>,
    now: u64,
}

impl<'a, K: Hash + Eq + Clone, V> ExpiringCursor<'a, K, V> {
    /// Wraps `inner`, judging expiry at clock reading `now`.
    pub fn new(inner: Cursor<'a, K, V>, now: u64) -> Self {
        Self { inner, now }
    }

    /// Advances to the next live entry.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&CacheEntry<K, V>> {
        loop {
            let expired = self.inner.next()?.is_expired(self.now);
            if !expired {
                break;
            }
        }
        self.inner.current()
    }

    /// Unlinks the entry most recently returned by [`next`](Self::next).
    pub fn remove(&mut self) -> Option<CacheEntry<K, V>> {
        self.inner.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LinkedStore, StoreOrder};

    fn store_with_ttls(ttls: &[(&'static str, u64)]) -> LinkedStore<&'static str, u64> {
        let mut store = LinkedStore::new(StoreOrder::Insertion);
        for &(key, ttl) in ttls {
            store.insert(CacheEntry::new(key, ttl, ttl, 0));
        }
        store
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let mut store = store_with_ttls(&[("a", 0), ("b", 0)]);
        let snapshot = SnapshotIter::new(store.iter().map(|e| *e.key()));
        store.remove(&"a");
        store.insert(CacheEntry::new("c", 0, 0, 0));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_is_single_pass() {
        let mut snapshot = SnapshotIter::from_vec(vec![1]);
        assert_eq!(snapshot.next(), Some(1));
        assert_eq!(snapshot.next(), None);
        assert_eq!(snapshot.next(), None);
        assert_eq!(SnapshotIter::<u8>::empty().count(), 0);
    }

    #[test]
    fn test_expiring_iter_skips_expired() {
        // ttl 10 expires at 11, ttl 0 never, ttl 100 alive at 50
        let store = store_with_ttls(&[("short", 10), ("forever", 0), ("long", 100)]);
        let live: Vec<_> = ExpiringIter::new(store.iter(), 50).map(|e| *e.key()).collect();
        assert_eq!(live, vec!["forever", "long"]);

        let all: Vec<_> = ExpiringIter::new(store.iter(), 5).map(|e| *e.key()).collect();
        assert_eq!(all, vec!["short", "forever", "long"]);
    }

    #[test]
    fn test_expiring_cursor_yields_live_and_removes() {
        let mut store = store_with_ttls(&[("a", 10), ("b", 0), ("c", 10), ("d", 0)]);
        let mut seen = Vec::new();
        {
            let mut cursor = ExpiringCursor::new(store.cursor(), 50);
            while let Some(entry) = cursor.next() {
                let key = *entry.key();
                seen.push(key);
                if key == "d" {
                    assert_eq!(cursor.remove().unwrap().into_parts().0, "d");
                }
            }
        }
        assert_eq!(seen, vec!["b", "d"]);
        // expired entries are skipped, not removed
        assert_eq!(store.len(), 3);
        assert!(store.contains(&"a"));
        assert!(!store.contains(&"d"));
    }
}
