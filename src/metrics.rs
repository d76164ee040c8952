//! Cache Metrics System
//!
//! Every cache keeps a small set of monotonically increasing counters. They are
//! atomics because hits and misses are recorded by readers that only hold a
//! shared lock. Counters are observational: relaxed ordering is enough and no
//! cache decision depends on them.
//!
//! Metrics are reported as a `BTreeMap` so the keys always come out in the same
//! order, which keeps logs and test output stable.

use crate::policy::RemovalCause;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a cache core.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    removals: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
    reclaimed: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_insertion(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removal(&self, cause: RemovalCause) {
        let counter = match cause {
            RemovalCause::Explicit => &self.removals,
            RemovalCause::Expired => &self.expirations,
            RemovalCause::Evicted => &self.evictions,
            RemovalCause::Reclaimed => &self.reclaimed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self, size: usize, capacity: usize) -> CoreCacheMetrics {
        CoreCacheMetrics {
            cache_hits: self.hits(),
            cache_misses: self.misses(),
            insertions: self.insertions.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
            size: size as u64,
            capacity: capacity as u64,
        }
    }
}

/// Point-in-time metrics common to all cache policies.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreCacheMetrics {
    /// Lookups that found a live entry
    pub cache_hits: u64,

    /// Lookups that found nothing or an expired entry
    pub cache_misses: u64,

    /// Values written through `put` or a get-or-insert
    pub insertions: u64,

    /// Entries removed by an explicit `remove`
    pub removals: u64,

    /// Entries removed because their ttl ran out
    pub expirations: u64,

    /// Live entries removed to respect the capacity
    pub evictions: u64,

    /// Entries removed because their weakly held key was dropped
    pub reclaimed: u64,

    /// Entries currently stored, expired ones included
    pub size: u64,

    /// Configured capacity; zero means unbounded
    pub capacity: u64,
}

impl CoreCacheMetrics {
    /// Total lookups.
    pub fn requests(&self) -> u64 {
        self.cache_hits + self.cache_misses
    }

    /// Fraction of lookups that hit, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            requests => self.cache_hits as f64 / requests as f64,
        }
    }

    /// Fraction of lookups that missed, or 0.0 before the first lookup.
    pub fn miss_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            requests => self.cache_misses as f64 / requests as f64,
        }
    }

    /// Fill level relative to capacity, or 0.0 for an unbounded cache.
    pub fn utilization(&self) -> f64 {
        if self.capacity > 0 {
            self.size as f64 / self.capacity as f64
        } else {
            0.0
        }
    }

    /// Converts the metrics to a map with deterministic key order.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert("cache_misses".to_string(), self.cache_misses as f64);
        metrics.insert("requests".to_string(), self.requests() as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("removals".to_string(), self.removals as f64);
        metrics.insert("expirations".to_string(), self.expirations as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("reclaimed".to_string(), self.reclaimed as f64);

        metrics.insert("size".to_string(), self.size as f64);
        metrics.insert("capacity".to_string(), self.capacity as f64);
        metrics.insert("utilization".to_string(), self.utilization());

        metrics
    }
}

/// Uniform metrics reporting for every cache type.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Identifies the eviction policy (e.g. "FIFO", "Timed").
    fn algorithm_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_insertion();
        counters.record_removal(RemovalCause::Expired);
        counters.record_removal(RemovalCause::Evicted);
        counters.record_removal(RemovalCause::Evicted);

        let snap = counters.snapshot(3, 4);
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.cache_misses, 1);
        assert_eq!(snap.insertions, 1);
        assert_eq!(snap.expirations, 1);
        assert_eq!(snap.evictions, 2);
        assert_eq!(snap.requests(), 3);
        assert!((snap.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!((snap.utilization() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rates_without_requests() {
        let snap = CoreCacheMetrics::default();
        assert_eq!(snap.hit_rate(), 0.0);
        assert_eq!(snap.miss_rate(), 0.0);
        assert_eq!(snap.utilization(), 0.0);
    }

    #[test]
    fn test_btreemap_keys_are_sorted() {
        let map = CoreCacheMetrics::default().to_btreemap();
        let keys: Vec<_> = map.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(map.contains_key("hit_rate"));
        assert!(map.contains_key("evictions"));
    }
}
