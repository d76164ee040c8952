//! Correctness Tests for Cache Policies
//!
//! This module validates the observable contract of every cache policy using
//! small caches and a manual clock, so expiry is driven without sleeping and
//! every eviction is predictable.
//!
//! ## Test Strategy
//! - Capacities of 2-4 entries
//! - Time only moves through `ManualClock::advance`
//! - Removal listeners record what they see so each notification is checked
//! - Each policy gets an explicit check of which key goes first

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tidecache::{
    Cache, CacheConfig, CacheError, CacheExt, CacheMetrics, CachePolicy, ExpiryMode, FifoCache,
    LfuCache, LruCache, ManualClock, NullCache, PessimisticTimedCache, RemovalListener, TimedCache,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

type Log<K, V> = Arc<Mutex<Vec<(K, V)>>>;

/// A listener that appends every notification to a shared log.
fn recorder<K, V>() -> (RemovalListener<K, V>, Log<K, V>)
where
    K: Send + 'static,
    V: Send + 'static,
{
    let log: Log<K, V> = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let listener: RemovalListener<K, V> = Arc::new(move |key, value| {
        sink.lock().unwrap().push((key, value));
    });
    (listener, log)
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn make_fifo(capacity: usize, ttl_ms: u64, clock: &Arc<ManualClock>) -> FifoCache<&'static str, i32> {
    let config = CacheConfig::new(capacity).with_default_ttl(millis(ttl_ms));
    FifoCache::init_with_clock(config, None, clock.clone())
}

fn make_timed(
    ttl_ms: u64,
    clock: &Arc<ManualClock>,
) -> (TimedCache<&'static str, i32>, Log<&'static str, i32>) {
    let (listener, log) = recorder();
    let cache = TimedCache::init_with_clock(CacheConfig::timed(millis(ttl_ms)), Some(listener), clock.clone());
    (cache, log)
}

// ============================================================================
// FIFO
// ============================================================================

#[test]
fn test_fifo_prune_evicts_oldest_insertion() {
    let cache = FifoCache::new(2, Duration::ZERO);
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);

    assert_eq!(cache.prune(), 1);
    assert_eq!(cache.get(&"a"), None);
    assert_eq!(cache.get(&"b"), Some(2));
    assert_eq!(cache.get(&"c"), Some(3));
}

#[test]
fn test_fifo_reads_do_not_change_eviction_order() {
    let clock = Arc::new(ManualClock::new());
    let cache = make_fifo(2, 0, &clock);
    cache.put("a", 1);
    cache.put("b", 2);
    for _ in 0..5 {
        assert_eq!(cache.get(&"a"), Some(1));
    }
    cache.put("c", 3);

    assert_eq!(cache.prune(), 1);
    assert!(!cache.contains_key(&"a"));
    assert!(cache.contains_key(&"b"));
}

#[test]
fn test_fifo_replacement_keeps_position() {
    let clock = Arc::new(ManualClock::new());
    let cache = make_fifo(2, 0, &clock);
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("a", 10);
    cache.put("c", 3);

    cache.prune();
    assert_eq!(cache.get(&"a"), None);
    assert_eq!(cache.get(&"b"), Some(2));
}

#[test]
fn test_fifo_prune_removes_expired_before_evicting() {
    let clock = Arc::new(ManualClock::new());
    let cache = make_fifo(3, 0, &clock);
    cache.put_with_ttl("short", 1, millis(10));
    cache.put("b", 2);
    cache.put("c", 3);
    clock.advance(millis(11));

    // the expired entry frees a slot, so no live entry is evicted
    assert_eq!(cache.prune(), 1);
    assert_eq!(cache.len(), 2);
    assert!(cache.contains_key(&"b"));
    assert!(cache.contains_key(&"c"));
}

#[test]
fn test_fifo_put_prunes_when_over_capacity() {
    let clock = Arc::new(ManualClock::new());
    let cache = make_fifo(2, 0, &clock);
    for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
        cache.put(key, i as i32);
        assert!(cache.len() <= 3, "len {} after {}", cache.len(), key);
    }
    cache.prune();
    assert!(cache.len() <= 2);
    assert!(cache.contains_key(&"e"));
}

// ============================================================================
// TIMED
// ============================================================================

#[test]
fn test_timed_expired_get_is_one_miss_and_one_notification() {
    let clock = Arc::new(ManualClock::new());
    let (cache, log) = make_timed(50, &clock);
    cache.put("x", 1);
    clock.advance(millis(60));

    let misses = cache.miss_count();
    assert_eq!(cache.get(&"x"), None);
    assert_eq!(cache.miss_count(), misses + 1);
    assert_eq!(cache.hit_count(), 0);
    assert_eq!(*log.lock().unwrap(), vec![("x", 1)]);

    // the get already unlinked it
    assert_eq!(cache.prune(), 0);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_timed_prune_removes_expired_entry_once() {
    let clock = Arc::new(ManualClock::new());
    let (cache, log) = make_timed(50, &clock);
    cache.put("x", 1);
    clock.advance(millis(60));

    assert!(!cache.contains_key(&"x"));
    assert_eq!(cache.prune(), 1);
    assert_eq!(cache.prune(), 0);
    assert_eq!(*log.lock().unwrap(), vec![("x", 1)]);
}

#[test]
fn test_timed_expiry_is_strictly_after_ttl() {
    let clock = Arc::new(ManualClock::new());
    let (cache, _log) = make_timed(50, &clock);
    cache.put("x", 1);
    clock.advance(millis(50));
    assert!(cache.contains_key(&"x"));
    clock.advance(millis(1));
    assert!(!cache.contains_key(&"x"));
}

#[test]
fn test_timed_never_evicts_live_entries() {
    let cache: TimedCache<u32, u32> = TimedCache::new(Duration::from_secs(60));
    for i in 0..1_000 {
        cache.put(i, i);
    }
    assert_eq!(cache.prune(), 0);
    assert_eq!(cache.len(), 1_000);
    assert_eq!(cache.capacity(), 0);
    assert!(!cache.is_full());
}

#[test]
fn test_sliding_expiry_refreshes_on_read() {
    let clock = Arc::new(ManualClock::new());
    let (cache, _log) = make_timed(50, &clock);
    cache.put("x", 1);
    for _ in 0..4 {
        clock.advance(millis(40));
        assert_eq!(cache.get(&"x"), Some(1));
    }

    // a read that opts out of the refresh does not extend the lifetime
    clock.advance(millis(40));
    assert_eq!(cache.get_with_access(&"x", false), Some(1));
    clock.advance(millis(20));
    assert_eq!(cache.get(&"x"), None);
}

#[test]
fn test_fixed_expiry_ignores_reads() {
    let clock = Arc::new(ManualClock::new());
    let config = CacheConfig::timed(millis(50)).with_expiry(ExpiryMode::Fixed);
    let cache: PessimisticTimedCache<&str, i32> = PessimisticTimedCache::init_with_clock(config, None, clock.clone());
    cache.put("x", 1);
    clock.advance(millis(40));
    assert_eq!(cache.get(&"x"), Some(1));
    clock.advance(millis(20));
    assert_eq!(cache.get(&"x"), None);
}

#[test]
fn test_zero_ttl_never_expires() {
    let clock = Arc::new(ManualClock::new());
    let cache: TimedCache<&str, i32> = TimedCache::init_with_clock(CacheConfig::timed(Duration::ZERO), None, clock.clone());
    cache.put("forever", 1);
    clock.advance(Duration::from_secs(86_400 * 365));
    assert_eq!(cache.get(&"forever"), Some(1));
    assert_eq!(cache.prune(), 0);
}

#[test]
fn test_per_entry_ttl_overrides_default() {
    let clock = Arc::new(ManualClock::new());
    let (cache, _log) = make_timed(1_000, &clock);
    cache.put_with_ttl("short", 1, millis(10));
    cache.put("long", 2);
    clock.advance(millis(11));

    assert_eq!(cache.prune(), 1);
    assert_eq!(cache.get(&"long"), Some(2));
    assert_eq!(cache.timeout(), millis(1_000));
}

// ============================================================================
// LRU / LFU
// ============================================================================

#[test]
fn test_lru_evicts_least_recently_used() {
    let cache = LruCache::new(3, Duration::ZERO);
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);
    cache.get(&"a");
    cache.put("d", 4);

    assert_eq!(cache.prune(), 1);
    assert!(!cache.contains_key(&"b"));
    for key in ["a", "c", "d"] {
        assert!(cache.contains_key(&key), "{key} should survive");
    }
}

#[test]
fn test_lru_contains_key_does_not_promote() {
    let cache = LruCache::new(2, Duration::ZERO);
    cache.put("a", 1);
    cache.put("b", 2);
    assert!(cache.contains_key(&"a"));
    cache.put("c", 3);

    cache.prune();
    assert!(!cache.contains_key(&"a"));
}

#[test]
fn test_lfu_evicts_least_frequently_used() {
    let cache = LfuCache::new(3, Duration::ZERO);
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);
    for _ in 0..3 {
        cache.get(&"a");
        cache.get(&"c");
    }
    cache.get(&"b");
    cache.put("d", 4);
    cache.get(&"d");
    cache.get(&"d");

    assert_eq!(cache.prune(), 1);
    assert!(!cache.contains_key(&"b"));
    assert_eq!(cache.len(), 3);
}

// ============================================================================
// CONTRACT PROPERTIES
// ============================================================================

#[test]
fn test_no_double_counting() {
    let caches: Vec<Box<dyn Cache<u32, u32>>> = vec![
        Box::new(FifoCache::new(0, Duration::ZERO)),
        Box::new(LruCache::new(0, Duration::ZERO)),
        Box::new(LfuCache::new(0, Duration::ZERO)),
        Box::new(TimedCache::new(Duration::ZERO)),
        Box::new(PessimisticTimedCache::new(Duration::ZERO)),
    ];
    for cache in caches {
        for key in 0..50 {
            cache.put(key, key);
        }
        for key in 0..100 {
            cache.get(&key);
        }
        assert_eq!(cache.hit_count(), 50);
        assert_eq!(cache.miss_count(), 50);
        assert_eq!(cache.hit_count() + cache.miss_count(), 100);
    }
}

#[test]
fn test_contains_key_is_not_counted() {
    let cache = LruCache::new(4, Duration::ZERO);
    cache.put(1, 1);
    assert!(cache.contains_key(&1));
    assert!(!cache.contains_key(&2));
    assert_eq!((cache.hit_count(), cache.miss_count()), (0, 0));
}

#[test]
fn test_idempotent_removal() {
    let (listener, log) = recorder();
    let cache = FifoCache::init(CacheConfig::new(4), Some(listener));
    cache.put("k", 1);

    assert_eq!(cache.remove(&"k"), Some(1));
    assert_eq!(cache.remove(&"k"), None);
    assert_eq!(*log.lock().unwrap(), vec![("k", 1)]);
}

#[test]
fn test_clear_does_not_notify() {
    let (listener, log) = recorder();
    let cache = LruCache::init(CacheConfig::new(4), Some(listener));
    cache.put("a", 1);
    cache.put("b", 2);
    cache.clear();

    assert!(cache.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_snapshot_iteration_is_point_in_time() {
    let cache = FifoCache::new(0, Duration::ZERO);
    for i in 0..5 {
        cache.put(i, i * 10);
    }
    let values = cache.iter();
    let entries = cache.entries();

    cache.remove(&0);
    cache.put(99, 990);
    cache.clear();

    assert_eq!(values.collect::<Vec<_>>(), vec![0, 10, 20, 30, 40]);
    let keys: Vec<_> = entries.map(|entry| entry.key).collect();
    assert_eq!(keys, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_iterators_skip_expired_entries() {
    let clock = Arc::new(ManualClock::new());
    let (cache, log) = make_timed(0, &clock);
    cache.put_with_ttl("short", 1, millis(5));
    cache.put("long", 2);
    clock.advance(millis(6));

    assert_eq!(cache.iter().collect::<Vec<_>>(), vec![2]);
    assert_eq!(cache.entries().count(), 1);
    // iterating is read-only
    assert_eq!(cache.len(), 2);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_listener_may_reenter_cache() {
    let cache: Arc<TimedCache<u32, u32>> = Arc::new_cyclic(|weak: &std::sync::Weak<TimedCache<u32, u32>>| {
        let weak = weak.clone();
        let listener: RemovalListener<u32, u32> = Arc::new(move |key, value| {
            if let Some(cache) = weak.upgrade() {
                cache.put(key + 100, value);
            }
        });
        TimedCache::init(CacheConfig::timed(Duration::ZERO), Some(listener))
    });
    cache.put(1, 7);
    cache.remove(&1);
    assert_eq!(cache.get(&101), Some(7));
}

#[test]
fn test_panicking_listener_leaves_cache_consistent() {
    let listener: RemovalListener<u32, u32> = Arc::new(|key, _| {
        if key == 1 {
            panic!("listener failure");
        }
    });
    let cache = LfuCache::init(CacheConfig::new(4), Some(listener));
    cache.put(1, 1);
    cache.put(2, 2);

    assert_eq!(cache.remove(&1), Some(1));
    assert!(!cache.contains_key(&1));
    cache.put(3, 3);
    assert_eq!(cache.len(), 2);
}

// ============================================================================
// GET OR INSERT
// ============================================================================

#[test]
fn test_get_or_insert_runs_supplier_once() {
    let cache = LruCache::new(4, Duration::ZERO);
    let mut calls = 0;
    for _ in 0..3 {
        let value = cache.get_or_insert_with("k", || {
            calls += 1;
            42
        });
        assert_eq!(value, 42);
    }
    assert_eq!(calls, 1);
    assert_eq!(cache.miss_count(), 1);
    assert_eq!(cache.hit_count(), 2);
}

#[test]
fn test_get_or_insert_supplier_may_use_cache() {
    let cache = FifoCache::new(4, Duration::ZERO);
    cache.put("base", 2);
    let value = cache.get_or_insert_with("derived", || cache.get(&"base").unwrap_or(0) * 21);
    assert_eq!(value, 42);
    assert_eq!(cache.get(&"derived"), Some(42));
}

#[test]
fn test_failed_supplier_inserts_nothing() {
    let cache = PessimisticTimedCache::new(Duration::ZERO);
    let result: Result<i32, String> =
        cache.try_get_or_insert_with("k", true, Duration::ZERO, || Err("backend down".to_string()));

    assert_eq!(result, Err("backend down".to_string()));
    assert!(cache.is_empty());
    assert_eq!(cache.miss_count(), 1);
}

#[test]
fn test_get_or_insert_uses_ttl_override() {
    let clock = Arc::new(ManualClock::new());
    let (cache, _log) = make_timed(1_000, &clock);
    cache.get_or_insert_with_ttl("k", true, millis(10), || 5);
    clock.advance(millis(11));
    assert_eq!(cache.get(&"k"), None);
}

// ============================================================================
// NULL CACHE, CONFIGURATION, METRICS
// ============================================================================

#[test]
fn test_null_cache_is_inert() {
    let cache: NullCache<u32, u32> = NullCache::new();
    for i in 0..10 {
        cache.put(i, i);
        assert_eq!(cache.get(&i), None);
        cache.remove(&i);
        cache.prune();
    }
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.get_or_insert_with(1, || 9), 9);
    assert_eq!(cache.get(&1), None);
}

#[test]
fn test_negative_configuration_is_rejected() {
    assert!(matches!(CacheConfig::from_signed(-1, 0), Err(CacheError::NegativeCapacity(-1))));
    assert!(matches!(CacheConfig::from_signed(1, -5), Err(CacheError::NegativeTtl(-5))));

    let config = CacheConfig::from_signed(8, 250).unwrap();
    assert_eq!(config.capacity, 8);
    assert_eq!(config.default_ttl, millis(250));
}

#[test]
fn test_policy_from_configuration_string() {
    for (name, algorithm_capacity) in [("fifo", 3), ("LRU", 3), (" lfu ", 3), ("timed", 0)] {
        let policy: CachePolicy = name.parse().unwrap();
        let cache = policy.build::<u32, u32>(CacheConfig::new(3), None);
        assert_eq!(cache.capacity(), algorithm_capacity, "{name}");
    }
    assert!(matches!("mru".parse::<CachePolicy>(), Err(CacheError::UnknownPolicy(_))));
}

#[test]
fn test_metrics_track_removal_causes() {
    let clock = Arc::new(ManualClock::new());
    let cache = make_fifo(2, 0, &clock);
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put_with_ttl("c", 3, millis(5));
    cache.remove(&"b");
    clock.advance(millis(6));
    cache.put("d", 4);
    // over capacity: drops the expired "c", then evicts "a"
    cache.put("e", 5);

    let metrics = cache.core_metrics();
    assert_eq!(metrics.insertions, 5);
    assert_eq!(metrics.removals, 1);
    assert_eq!(metrics.expirations, 1);
    assert_eq!(metrics.evictions, 1);
    assert_eq!(cache.algorithm_name(), "FIFO");
    assert_eq!(cache.metrics()["size"], cache.len() as f64);
}
