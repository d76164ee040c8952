//! Lock-free cache primitives.
//!
//! `CacheCore` owns the backing store, the configured limits and the counters.
//! None of its methods lock anything: the concurrency disciplines in
//! [`concurrent`](crate::concurrent) decide which primitives run under a shared
//! guard and which need exclusive access.
//!
//! Methods that can unlink entries take a `removed` buffer instead of calling
//! the removal listener themselves, so the listener always runs after the
//! discipline has released its lock.

use crate::clock::{self, Clock};
use crate::config::{CacheConfig, ExpiryMode};
use crate::entry::{CacheEntry, EntrySnapshot};
use crate::iter::ExpiringIter;
use crate::metrics::{CoreCacheMetrics, Counters};
use crate::policy::{EvictionPolicy, PruneContext, RemovalCause, Removed};
use crate::store::LinkedStore;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Outcome of a lookup under a shared guard.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Lookup<V> {
    /// A live entry; the hit has been counted.
    Hit(V),
    /// No entry; the miss has been counted.
    Miss,
    /// An expired entry that needs exclusive access to remove. Nothing has been
    /// counted yet.
    Expired,
}

pub(crate) struct CacheCore<K, V, P> {
    store: LinkedStore<K, V>,
    policy: P,
    capacity: usize,
    default_ttl: u64,
    expiry: ExpiryMode,
    /// Set once any entry is stored with a ttl other than the default.
    has_custom_ttl: bool,
    counters: Counters,
    clock: Arc<dyn Clock>,
}

impl<K, V, P> CacheCore<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    P: EvictionPolicy<K, V>,
{
    pub(crate) fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: LinkedStore::new(P::ORDER),
            policy: P::default(),
            capacity: if P::BOUNDED { config.capacity } else { 0 },
            default_ttl: clock::ttl_millis(config.default_ttl),
            expiry: config.expiry,
            has_custom_ttl: false,
            counters: Counters::default(),
            clock,
        }
    }

    #[inline]
    pub(crate) fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.capacity > 0 && self.store.len() >= self.capacity
    }

    #[inline]
    pub(crate) fn hits(&self) -> u64 {
        self.counters.hits()
    }

    #[inline]
    pub(crate) fn misses(&self) -> u64 {
        self.counters.misses()
    }

    #[inline]
    fn refresh(&self, update_last_access: bool) -> bool {
        update_last_access && self.expiry == ExpiryMode::Sliding
    }

    fn prune_context(&self, now: u64) -> PruneContext {
        PruneContext {
            now,
            capacity: self.capacity,
            may_expire: self.default_ttl > 0 || self.has_custom_ttl,
        }
    }

    fn unlink(&mut self, key: &K, cause: RemovalCause, removed: &mut Vec<Removed<K, V>>) {
        if let Some(entry) = self.store.remove(key) {
            self.counters.record_removal(cause);
            removed.push(Removed::from_entry(entry, cause));
        }
    }

    /// Looks up `key` without structural changes.
    ///
    /// Safe under a shared guard as long as the store is insertion-ordered;
    /// access-ordered stores must use [`lookup_mut`](Self::lookup_mut).
    pub(crate) fn lookup(&self, key: &K, update_last_access: bool) -> Lookup<V> {
        let now = self.now();
        match self.store.get(key) {
            None => {
                self.counters.record_miss();
                Lookup::Miss
            }
            Some(entry) if entry.is_expired(now) => Lookup::Expired,
            Some(entry) => {
                self.counters.record_hit();
                Lookup::Hit(entry.value(self.refresh(update_last_access), now).clone())
            }
        }
    }

    /// Looks up `key` with exclusive access: removes it if expired and
    /// promotes it if the store tracks access order.
    pub(crate) fn lookup_mut(
        &mut self,
        key: &K,
        update_last_access: bool,
        removed: &mut Vec<Removed<K, V>>,
    ) -> Option<V> {
        match self.lookup(key, update_last_access) {
            Lookup::Hit(value) => {
                self.store.promote(key);
                Some(value)
            }
            Lookup::Miss => None,
            Lookup::Expired => {
                self.counters.record_miss();
                self.unlink(key, RemovalCause::Expired, removed);
                None
            }
        }
    }

    /// Whether a live entry exists. Counts neither hit nor miss.
    pub(crate) fn contains_live(&self, key: &K) -> bool {
        let now = self.now();
        self.store.get(key).is_some_and(|entry| !entry.is_expired(now))
    }

    /// Stores `value`, replacing any entry for `key` without notification.
    ///
    /// A zero `ttl` selects the cache default. Inserting a new key into a
    /// bounded cache that is over capacity prunes first.
    pub(crate) fn insert(&mut self, key: K, value: V, ttl: Duration, removed: &mut Vec<Removed<K, V>>) {
        let ttl = if ttl.is_zero() {
            self.default_ttl
        } else {
            let ttl = clock::ttl_millis(ttl);
            if ttl != self.default_ttl {
                self.has_custom_ttl = true;
            }
            ttl
        };

        if self.capacity > 0 && self.store.len() > self.capacity && !self.store.contains(&key) {
            self.prune(removed);
        }

        let now = self.now();
        self.store.insert(CacheEntry::new(key, value, ttl, now));
        self.counters.record_insertion();

        let before = removed.len();
        self.policy.after_write(&mut self.store, removed);
        self.record_pruned(&removed[before..], "purged cache after write");
    }

    /// Returns the live value for `key`, or stores and returns `value`.
    ///
    /// Counts neither hit nor miss; callers have already counted the lookup
    /// that led here.
    pub(crate) fn insert_if_absent(
        &mut self,
        key: K,
        value: V,
        ttl: Duration,
        update_last_access: bool,
        removed: &mut Vec<Removed<K, V>>,
    ) -> V {
        let now = self.now();
        let refresh = self.refresh(update_last_access);
        match self.store.get(&key) {
            Some(entry) if !entry.is_expired(now) => {
                let existing = entry.value(refresh, now).clone();
                self.store.promote(&key);
                return existing;
            }
            Some(_) => self.unlink(&key, RemovalCause::Expired, removed),
            None => {}
        }
        self.insert(key, value.clone(), ttl, removed);
        value
    }

    /// Unlinks `key`. The flag tells whether the entry was still live; an
    /// expired entry is recorded as an expiration.
    pub(crate) fn remove(&mut self, key: &K) -> Option<(Removed<K, V>, bool)> {
        let now = self.now();
        let entry = self.store.remove(key)?;
        let live = !entry.is_expired(now);
        let cause = if live { RemovalCause::Explicit } else { RemovalCause::Expired };
        self.counters.record_removal(cause);
        Some((Removed::from_entry(entry, cause), live))
    }

    /// Runs the policy prune and returns how many entries it removed.
    pub(crate) fn prune(&mut self, removed: &mut Vec<Removed<K, V>>) -> usize {
        let before = removed.len();
        let ctx = self.prune_context(self.now());
        self.policy.prune(&mut self.store, &ctx, removed);
        self.record_pruned(&removed[before..], "pruned cache")
    }

    fn record_pruned(&self, pruned: &[Removed<K, V>], summary: &'static str) -> usize {
        for entry in pruned {
            self.counters.record_removal(entry.cause);
            trace!(policy = P::NAME, cause = ?entry.cause, "cache entry pruned");
        }
        if !pruned.is_empty() {
            debug!(
                policy = P::NAME,
                removed = pruned.len(),
                remaining = self.store.len(),
                "{summary}"
            );
        }
        pruned.len()
    }

    /// Drops every entry without notification.
    pub(crate) fn clear(&mut self) {
        self.store.clear();
    }

    /// Copies the live values in store order.
    pub(crate) fn values(&self) -> Vec<V> {
        ExpiringIter::new(self.store.iter(), self.now())
            .map(|entry| entry.peek().clone())
            .collect()
    }

    /// Copies the live entries in store order.
    pub(crate) fn entries(&self) -> Vec<EntrySnapshot<K, V>> {
        ExpiringIter::new(self.store.iter(), self.now())
            .map(CacheEntry::snapshot)
            .collect()
    }

    pub(crate) fn metrics(&self) -> CoreCacheMetrics {
        self.counters.snapshot(self.store.len(), self.capacity)
    }
}
