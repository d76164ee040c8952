//! Cache Configuration Module
//!
//! Configuration is plain data with public fields, plus a few builder methods
//! for the common cases.
//!
//! # Design Philosophy
//!
//! - **Simple**: Create the struct directly or start from [`CacheConfig::new`]
//! - **Type safety**: `usize` capacities and `Duration` ttls cannot be negative
//! - **Checked import**: [`CacheConfig::from_signed`] validates numbers that
//!   come from outside the program (settings files, environment variables)
//!
//! # Fields
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `capacity` | Maximum number of entries; `0` means unbounded |
//! | `default_ttl` | Ttl applied by `put` without an explicit ttl; zero never expires |
//! | `expiry` | Whether reads push expiry back ([`ExpiryMode`]) |
//!
//! Timed and weak-key caches ignore `capacity`: they only ever remove entries
//! because of expiry.
//!
//! # Examples
//!
//! ```
//! use tidecache::config::CacheConfig;
//! use tidecache::{Cache, FifoCache};
//! use std::time::Duration;
//!
//! let config = CacheConfig::new(1_000).with_default_ttl(Duration::from_secs(30));
//! let cache: FifoCache<String, Vec<u8>> = FifoCache::init(config, None);
//! assert_eq!(cache.capacity(), 1_000);
//! ```

pub mod pruner;

pub use pruner::PrunerConfig;

use crate::error::CacheError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How reads affect an entry's expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryMode {
    /// Reads that ask for it refresh the last access time, so the ttl is
    /// measured from the most recent access.
    #[default]
    Sliding,
    /// Reads never refresh the access time, so the ttl is measured from the
    /// last `put`.
    Fixed,
}

/// Configuration shared by all cache policies.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries. `0` means unbounded.
    pub capacity: usize,
    /// Ttl used by `put` when no explicit ttl is given. Zero never expires.
    pub default_ttl: Duration,
    /// Whether reads refresh the access time.
    pub expiry: ExpiryMode,
}

impl CacheConfig {
    /// A bounded configuration whose entries never expire by default.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            default_ttl: Duration::ZERO,
            expiry: ExpiryMode::Sliding,
        }
    }

    /// An unbounded configuration whose entries expire after `default_ttl`.
    #[must_use]
    pub fn timed(default_ttl: Duration) -> Self {
        Self::new(0).with_default_ttl(default_ttl)
    }

    /// Validates numbers taken from an untyped source.
    ///
    /// # Errors
    ///
    /// [`CacheError::NegativeCapacity`] or [`CacheError::NegativeTtl`] if
    /// either value is below zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidecache::config::CacheConfig;
    /// use std::time::Duration;
    ///
    /// let config = CacheConfig::from_signed(16, 250).unwrap();
    /// assert_eq!(config.capacity, 16);
    /// assert_eq!(config.default_ttl, Duration::from_millis(250));
    ///
    /// assert!(CacheConfig::from_signed(-1, 0).is_err());
    /// ```
    pub fn from_signed(capacity: i64, default_ttl_millis: i64) -> Result<Self, CacheError> {
        let capacity =
            usize::try_from(capacity).map_err(|_| CacheError::NegativeCapacity(capacity))?;
        let ttl = u64::try_from(default_ttl_millis)
            .map_err(|_| CacheError::NegativeTtl(default_ttl_millis))?;
        Ok(Self::new(capacity).with_default_ttl(Duration::from_millis(ttl)))
    }

    /// Sets the capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the default ttl.
    #[must_use]
    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Sets the expiry mode.
    #[must_use]
    pub fn with_expiry(mut self, expiry: ExpiryMode) -> Self {
        self.expiry = expiry;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Names a cache policy so it can be chosen from configuration.
///
/// Parsing accepts the lowercase names below; `none` selects a cache that
/// stores nothing, which disables caching without touching call sites.
///
/// | Name | Cache |
/// |------|-------|
/// | `fifo` | [`FifoCache`](crate::FifoCache) |
/// | `lru` | [`LruCache`](crate::LruCache) |
/// | `lfu` | [`LfuCache`](crate::LfuCache) |
/// | `timed` | [`TimedCache`](crate::TimedCache) |
/// | `pessimistic-timed` | [`PessimisticTimedCache`](crate::PessimisticTimedCache) |
/// | `none` | [`NullCache`](crate::NullCache) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// First in, first out.
    Fifo,
    /// Least recently used.
    Lru,
    /// Least frequently used.
    Lfu,
    /// Expiry only, optimistic reads.
    Timed,
    /// Expiry only, single lock.
    PessimisticTimed,
    /// Caching disabled.
    None,
}

impl CachePolicy {
    /// The name accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            CachePolicy::Fifo => "fifo",
            CachePolicy::Lru => "lru",
            CachePolicy::Lfu => "lfu",
            CachePolicy::Timed => "timed",
            CachePolicy::PessimisticTimed => "pessimistic-timed",
            CachePolicy::None => "none",
        }
    }
}

impl FromStr for CachePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(CachePolicy::Fifo),
            "lru" => Ok(CachePolicy::Lru),
            "lfu" => Ok(CachePolicy::Lfu),
            "timed" => Ok(CachePolicy::Timed),
            "pessimistic-timed" | "pessimistic_timed" => Ok(CachePolicy::PessimisticTimed),
            "none" | "null" | "off" => Ok(CachePolicy::None),
            _ => Err(CacheError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
