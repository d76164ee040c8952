//! Ordered Backing Store
//!
//! `LinkedStore` is the associative store every cache policy composes over: a
//! hash map from key to list node, plus a doubly linked list that fixes the
//! iteration order.
//!
//! ```text
//!   map: K ──▶ *mut Node ─┐
//!                         ▼
//!   list: head ⇄ [oldest] ⇄ ... ⇄ [newest] ⇄ tail
//! ```
//!
//! Two orders are supported:
//!
//! - [`StoreOrder::Insertion`]: re-inserting a key keeps its original slot, so
//!   the head is always the oldest insertion. Lookups never change structure.
//! - [`StoreOrder::Access`]: hits and re-inserts move the entry to the tail, so
//!   the head is the least recently used entry. Lookups that
//!   [`promote`](LinkedStore::promote) therefore need exclusive access.
//!
//! Pruning walks the store with a [`Cursor`], which can unlink the entry it
//! just yielded without invalidating the walk.

use crate::entry::CacheEntry;
use crate::list::{List, Node};
use std::fmt;
use std::hash::Hash;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

type NodePtr<K, V> = *mut Node<CacheEntry<K, V>>;

/// Iteration order maintained by a [`LinkedStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrder {
    /// Oldest insertion first; lookups are read-only.
    Insertion,
    /// Least recently used first; hits reorder the store.
    Access,
}

/// Hash map plus linked list, keyed by `K`, holding [`CacheEntry`] values.
///
/// # Safety
///
/// The map holds raw pointers into `list`. They stay valid because every node
/// is created by `list.push_back`, and a node is freed only after its map slot
/// has been removed (or both are cleared together).
pub struct LinkedStore<K, V> {
    map: HashMap<K, NodePtr<K, V>>,
    list: List<CacheEntry<K, V>>,
    order: StoreOrder,
}

// SAFETY: LinkedStore owns all nodes its pointers refer to; moving it to
// another thread moves that ownership along with it.
unsafe impl<K: Send, V: Send> Send for LinkedStore<K, V> {}

// SAFETY: shared access only reads nodes; the only mutation reachable through
// `&self` goes through the atomics inside `CacheEntry`.
unsafe impl<K: Sync, V: Sync> Sync for LinkedStore<K, V> {}

impl<K: Hash + Eq + Clone, V> LinkedStore<K, V> {
    /// Creates an empty store with the given iteration order.
    pub fn new(order: StoreOrder) -> Self {
        Self {
            map: HashMap::new(),
            list: List::new(),
            order,
        }
    }

    /// The order this store maintains.
    #[inline]
    pub fn order(&self) -> StoreOrder {
        self.order
    }

    /// Number of entries, expired ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the store holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Looks up an entry without changing the order.
    pub fn get(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        let node = *self.map.get(key)?;
        // SAFETY: node comes from our map
        unsafe { Some((*node).get_value()) }
    }

    /// Returns `true` if an entry for `key` exists, expired or not.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Records a hit for ordering purposes: moves the entry to the tail in an
    /// access-ordered store, does nothing in an insertion-ordered one.
    pub fn promote(&mut self, key: &K) {
        if self.order != StoreOrder::Access {
            return;
        }
        if let Some(&node) = self.map.get(key) {
            // SAFETY: node comes from our map
            unsafe { self.list.move_to_back(node) };
        }
    }

    /// Inserts an entry, returning the entry it replaced.
    ///
    /// A replaced entry keeps its slot in an insertion-ordered store and moves
    /// to the tail in an access-ordered one. The map is re-keyed with the new
    /// entry's key, so the two never disagree.
    pub fn insert(&mut self, entry: CacheEntry<K, V>) -> Option<CacheEntry<K, V>> {
        let key = entry.key().clone();
        if let Some(node) = self.map.remove(&key) {
            // SAFETY: node came from our map and is still linked
            let old = unsafe {
                let old = self.list.replace(node, entry);
                if self.order == StoreOrder::Access {
                    self.list.move_to_back(node);
                }
                old
            };
            self.map.insert(key, node);
            return Some(old);
        }

        let node = self.list.push_back(entry);
        self.map.insert(key, node);
        None
    }

    /// Unlinks and returns the entry for `key`.
    pub fn remove(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        let node = self.map.remove(key)?;
        // SAFETY: node came from our map and has just been unmapped
        unsafe {
            let boxed = self.list.remove(node)?;
            Some(boxed.into_value())
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }

    /// Iterates entries in store order, expired ones included.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: &self.list,
            next: self.list.first(),
            remaining: self.list.len(),
        }
    }

    /// Opens a cursor that can remove the entries it visits.
    pub fn cursor(&mut self) -> Cursor<'_, K, V> {
        let upcoming = self.list.first();
        Cursor {
            store: self,
            current: None,
            upcoming,
        }
    }
}

impl<K, V> fmt::Debug for LinkedStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedStore")
            .field("len", &self.map.len())
            .field("order", &self.order)
            .finish()
    }
}

/// Read-only iterator over a [`LinkedStore`] in store order.
pub struct Iter<'a, K, V> {
    list: &'a List<CacheEntry<K, V>>,
    next: Option<NodePtr<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: the shared borrow of the store keeps every node alive and linked
        unsafe {
            self.next = self.list.next_of(node);
            self.remaining -= 1;
            Some((*node).get_value())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// A forward-only walk over a [`LinkedStore`] that may unlink the entry it
/// yielded last.
///
/// The following node is fetched before an entry is handed out, so removing
/// the current entry never disturbs the walk. Yielded entries borrow the
/// cursor, so this is a lending cursor rather than an `Iterator`.
pub struct Cursor<'a, K, V> {
    store: &'a mut LinkedStore<K, V>,
    current: Option<NodePtr<K, V>>,
    upcoming: Option<NodePtr<K, V>>,
}

impl<K: Hash + Eq + Clone, V> Cursor<'_, K, V> {
    /// Advances to the next entry.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&CacheEntry<K, V>> {
        self.current = None;
        let node = self.upcoming?;
        // SAFETY: upcoming is either the list's first node or the successor of
        // a node that was still linked when it was read; removal only ever
        // unlinks `current`, which precedes it
        unsafe {
            self.upcoming = self.store.list.next_of(node);
            self.current = Some(node);
            Some((*node).get_value())
        }
    }

    /// The entry most recently returned by [`next`](Self::next), unless removed.
    pub fn current(&self) -> Option<&CacheEntry<K, V>> {
        let node = self.current?;
        // SAFETY: current is linked until remove() clears it
        unsafe { Some((*node).get_value()) }
    }

    /// Unlinks the entry most recently returned by [`next`](Self::next).
    ///
    /// Returns `None` if nothing was yielded yet or it was already removed.
    pub fn remove(&mut self) -> Option<CacheEntry<K, V>> {
        let node = self.current.take()?;
        // SAFETY: current was yielded by next() and has not been unlinked since
        let entry = unsafe { self.store.list.remove(node)?.into_value() };
        self.store.map.remove(entry.key());
        Some(entry)
    }

    /// Number of entries remaining in the store, including those not yet visited.
    pub fn store_len(&self) -> usize {
        self.store.len()
    }
}
