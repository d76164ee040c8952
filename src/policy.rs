//! Eviction Policies
//!
//! A policy decides which entries a prune removes. Policies are stateless
//! marker types plugged into a concurrency discipline as a type parameter:
//!
//! ```text
//!   OptimisticCache<K, V, Fifo>    PessimisticCache<K, V, Lru>
//!          │                              │
//!          └──────── CacheCore ───────────┘
//!                        │
//!            EvictionPolicy::prune(store, ctx, removed)
//! ```
//!
//! `prune` runs with exclusive access to the store. It unlinks entries and
//! pushes them onto `removed`; the discipline invokes the removal listener for
//! them after it has released its lock.
//!
//! | Policy | Store order | Bounded | Removes |
//! |--------|-------------|---------|---------|
//! | [`Fifo`](crate::fifo::Fifo) | insertion | yes | expired, then the oldest survivor |
//! | [`Lru`](crate::lru::Lru) | access | yes | expired, then the least recently used |
//! | [`Lfu`](crate::lfu::Lfu) | insertion | yes | expired, then the least frequently used |
//! | [`Timed`](crate::timed::Timed) | insertion | no | expired only |
//! | `WeakTimed` (feature `weak`) | insertion | no | expired and reclaimed, also every few writes |

use crate::entry::CacheEntry;
use crate::store::{LinkedStore, StoreOrder};
use std::hash::Hash;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Removed by the caller through `remove`.
    Explicit,
    /// Its ttl ran out.
    Expired,
    /// Removed live to make room.
    Evicted,
    /// Its weakly held key was dropped.
    Reclaimed,
}

/// An entry unlinked from the store, waiting for its removal notification.
#[derive(Debug)]
pub struct Removed<K, V> {
    /// The entry's key.
    pub key: K,
    /// The entry's value.
    pub value: V,
    /// Why it was removed.
    pub cause: RemovalCause,
}

impl<K, V> Removed<K, V> {
    /// Takes ownership of an unlinked entry.
    pub fn from_entry(entry: CacheEntry<K, V>, cause: RemovalCause) -> Self {
        let (key, value) = entry.into_parts();
        Self { key, value, cause }
    }
}

/// Inputs to a single prune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneContext {
    /// Clock reading the prune judges expiry against.
    pub now: u64,
    /// Capacity of the cache; zero means unbounded.
    pub capacity: usize,
    /// Whether any entry can have a ttl. When false no entry can be expired.
    pub may_expire: bool,
}

impl PruneContext {
    /// Whether `len` entries fill a bounded cache.
    #[inline]
    pub fn is_full(&self, len: usize) -> bool {
        self.capacity > 0 && len >= self.capacity
    }
}

/// Decides which entries a prune removes.
///
/// Implementations must only unlink entries; listeners and counters are
/// handled by the caller using the causes pushed onto `removed`.
pub trait EvictionPolicy<K: Hash + Eq + Clone, V>: Default + Send + Sync + 'static {
    /// Name reported through [`CacheMetrics::algorithm_name`](crate::metrics::CacheMetrics::algorithm_name).
    const NAME: &'static str;

    /// Order the backing store must maintain.
    const ORDER: StoreOrder;

    /// Whether the policy honors the configured capacity. Unbounded policies
    /// run with capacity zero.
    const BOUNDED: bool;

    /// Removes entries from `store`, recording each one in `removed`.
    fn prune(&self, store: &mut LinkedStore<K, V>, ctx: &PruneContext, removed: &mut Vec<Removed<K, V>>);

    /// Runs after every insert, under the same exclusive access. Policies
    /// whose entries can die without expiring purge them here; the default
    /// does nothing.
    fn after_write(&mut self, _store: &mut LinkedStore<K, V>, _removed: &mut Vec<Removed<K, V>>) {}
}

/// Removes every expired entry.
pub(crate) fn prune_expired<K: Hash + Eq + Clone, V>(
    store: &mut LinkedStore<K, V>,
    now: u64,
    removed: &mut Vec<Removed<K, V>>,
) {
    let mut cursor = store.cursor();
    while let Some(entry) = cursor.next() {
        if entry.is_expired(now) {
            if let Some(entry) = cursor.remove() {
                removed.push(Removed::from_entry(entry, RemovalCause::Expired));
            }
        }
    }
}

/// Removes every expired entry, then evicts the first surviving entry in store
/// order if the cache is still full.
///
/// Over an insertion-ordered store the first survivor is the oldest insertion;
/// over an access-ordered store it is the least recently used entry.
pub(crate) fn prune_expired_then_first<K: Hash + Eq + Clone, V>(
    store: &mut LinkedStore<K, V>,
    ctx: &PruneContext,
    removed: &mut Vec<Removed<K, V>>,
) {
    let mut first_live: Option<K> = None;
    {
        let mut cursor = store.cursor();
        while let Some(entry) = cursor.next() {
            if ctx.may_expire && entry.is_expired(ctx.now) {
                if let Some(entry) = cursor.remove() {
                    removed.push(Removed::from_entry(entry, RemovalCause::Expired));
                }
            } else if first_live.is_none() {
                first_live = Some(entry.key().clone());
                if !ctx.may_expire {
                    break;
                }
            }
        }
    }

    if ctx.is_full(store.len()) {
        if let Some(entry) = first_live.and_then(|key| store.remove(&key)) {
            removed.push(Removed::from_entry(entry, RemovalCause::Evicted));
        }
    }
}
