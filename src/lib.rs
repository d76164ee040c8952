#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Policy Selection Guide
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                     Which Cache Should I Use?                            │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │                                                                          │
//! │  Must the cache stay below a size?                                       │
//! │        │                                                                 │
//! │       No ──▶ Are keys owned elsewhere (Arc) and should entries die       │
//! │        │     with them?                                                  │
//! │        │        Yes ──▶ WeakKeyCache                                     │
//! │        │        No  ──▶ TimedCache (PessimisticTimedCache for few        │
//! │        │                readers and many writers)                        │
//! │       Yes                                                                │
//! │        │                                                                 │
//! │        ▼                                                                 │
//! │  Which entries should go first?                                          │
//! │     oldest insertion   ──▶ FifoCache   (reads share a lock)              │
//! │     least recently used ──▶ LruCache   (single lock)                     │
//! │     least often used   ──▶ LfuCache    (single lock)                     │
//! │                                                                          │
//! │  Caching switched off by configuration? ──▶ NullCache                    │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Type | Policy | Discipline | Bounded |
//! |------|--------|------------|---------|
//! | [`FifoCache`] | first in, first out | optimistic | yes |
//! | [`LruCache`] | least recently used | pessimistic | yes |
//! | [`LfuCache`] | least frequently used | pessimistic | yes |
//! | [`TimedCache`] | expiry only | optimistic | no |
//! | [`PessimisticTimedCache`] | expiry only | pessimistic | no |
//! | [`WeakKeyCache`] | expiry and key reclamation | optimistic | no |
//! | [`NullCache`] | stores nothing | none | no |
//!
//! ## Modules
//!
//! - [`cache`]: the [`Cache`] contract and the [`CacheExt`] get-or-insert helpers
//! - [`concurrent`]: the two locking disciplines every cache is built on
//! - [`policy`]: the [`EvictionPolicy`] trait the disciplines are generic over
//! - [`pruner`]: background pruning through an injected [`BackgroundPruner`]
//! - [`config`]: [`CacheConfig`], [`CachePolicy`] and pruner settings
//! - [`clock`]: time sources, including a manual clock for tests
//! - [`metrics`]: hit, miss and removal counters
//! - [`entry`], [`store`], [`iter`]: entries, the ordered backing store and
//!   the iterators over it

/// Doubly linked list with raw node handles.
///
/// **Note**: This module is internal infrastructure. It exposes unsafe raw
/// pointer operations whose invariants [`store::LinkedStore`] maintains.
pub(crate) mod list;

pub mod entry;

pub mod store;

pub mod iter;

pub mod clock;

pub mod error;

pub mod config;

pub mod metrics;

pub mod policy;

pub(crate) mod cache_core;

pub mod cache;

pub mod concurrent;

pub mod pruner;

/// First in, first out cache.
pub mod fifo;

/// Least recently used cache.
pub mod lru;

/// Least frequently used cache.
pub mod lfu;

/// Expiry-only caches.
pub mod timed;

/// Weak-key cache.
#[cfg(feature = "weak")]
pub mod weak;

/// No-op cache.
pub mod null;

mod factory;

pub use cache::{Cache, CacheExt, RemovalListener};
pub use clock::{Clock, ManualClock, SystemClock};
pub use concurrent::{OptimisticCache, PessimisticCache};
pub use config::{CacheConfig, CachePolicy, ExpiryMode, PrunerConfig};
pub use entry::{CacheEntry, EntrySnapshot};
pub use error::CacheError;
pub use fifo::FifoCache;
pub use iter::SnapshotIter;
pub use lfu::LfuCache;
pub use lru::LruCache;
pub use metrics::{CacheMetrics, CoreCacheMetrics};
pub use null::NullCache;
pub use policy::{EvictionPolicy, RemovalCause};
pub use pruner::{BackgroundPruner, PruneHandle, ThreadPruner};
pub use timed::{PessimisticTimedCache, TimedCache};

#[cfg(feature = "weak")]
pub use weak::{WeakKeyCache, WeakRemovalListener};
