//! Building caches from a [`CachePolicy`] chosen at runtime.

use crate::cache::{Cache, RemovalListener};
use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, CachePolicy};
use crate::fifo::FifoCache;
use crate::lfu::LfuCache;
use crate::lru::LruCache;
use crate::null::NullCache;
use crate::timed::{PessimisticTimedCache, TimedCache};
use std::hash::Hash;
use std::sync::Arc;

impl CachePolicy {
    /// Builds a cache of this policy behind the [`Cache`] trait.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidecache::config::{CacheConfig, CachePolicy};
    /// use tidecache::Cache;
    ///
    /// let policy: CachePolicy = "lru".parse().unwrap();
    /// let cache = policy.build::<String, u64>(CacheConfig::new(128), None);
    /// cache.put("answer".to_string(), 42);
    /// assert_eq!(cache.get(&"answer".to_string()), Some(42));
    ///
    /// let disabled = CachePolicy::None.build::<String, u64>(CacheConfig::new(128), None);
    /// disabled.put("answer".to_string(), 42);
    /// assert!(disabled.get(&"answer".to_string()).is_none());
    /// ```
    pub fn build<K, V>(self, config: CacheConfig, listener: Option<RemovalListener<K, V>>) -> Arc<dyn Cache<K, V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.build_with_clock(config, listener, Arc::new(SystemClock))
    }

    /// Like [`build`](Self::build), reading time from `clock`.
    pub fn build_with_clock<K, V>(
        self,
        config: CacheConfig,
        listener: Option<RemovalListener<K, V>>,
        clock: Arc<dyn Clock>,
    ) -> Arc<dyn Cache<K, V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        match self {
            CachePolicy::Fifo => Arc::new(FifoCache::init_with_clock(config, listener, clock)),
            CachePolicy::Lru => Arc::new(LruCache::init_with_clock(config, listener, clock)),
            CachePolicy::Lfu => Arc::new(LfuCache::init_with_clock(config, listener, clock)),
            CachePolicy::Timed => Arc::new(TimedCache::init_with_clock(config, listener, clock)),
            CachePolicy::PessimisticTimed => {
                Arc::new(PessimisticTimedCache::init_with_clock(config, listener, clock))
            }
            CachePolicy::None => Arc::new(NullCache::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    #[test]
    fn test_build_honors_capacity_per_policy() {
        for (policy, capacity) in [
            (CachePolicy::Fifo, 2),
            (CachePolicy::Lru, 2),
            (CachePolicy::Lfu, 2),
            (CachePolicy::Timed, 0),
            (CachePolicy::PessimisticTimed, 0),
            (CachePolicy::None, 0),
        ] {
            let cache = policy.build::<u32, u32>(CacheConfig::new(2), None);
            assert_eq!(cache.capacity(), capacity, "{}", policy);
        }
    }

    #[test]
    fn test_built_caches_share_expiry_semantics() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig::new(10).with_default_ttl(Duration::from_millis(20));
        for policy in [
            CachePolicy::Fifo,
            CachePolicy::Lru,
            CachePolicy::Lfu,
            CachePolicy::Timed,
            CachePolicy::PessimisticTimed,
        ] {
            let cache = policy.build_with_clock::<u32, u32>(config, None, clock.clone());
            cache.put(1, 1);
            assert_eq!(cache.get(&1), Some(1), "{}", policy);
            clock.advance(Duration::from_millis(21));
            assert_eq!(cache.get(&1), None, "{}", policy);
            assert_eq!((cache.hit_count(), cache.miss_count()), (1, 1), "{}", policy);
        }
    }
}
