//! Concurrency Disciplines
//!
//! Every cache in this crate is one of two wrappers around the same lock-free
//! core, parameterized by an [`EvictionPolicy`](crate::policy::EvictionPolicy):
//!
//! | Type | Lock | Reads | Suitable stores |
//! |------|------|-------|-----------------|
//! | [`OptimisticCache`] | `parking_lot::RwLock` | shared, `try_read` first | insertion-ordered |
//! | [`PessimisticCache`] | `parking_lot::Mutex` | exclusive | any, including access-ordered |
//!
//! ## Why Two Disciplines?
//!
//! A FIFO or timed cache never changes the shape of its store on a hit: the
//! access time and count are atomics inside the entry. Readers can therefore
//! share the lock and only writers exclude each other. An LRU cache moves the
//! hit entry to the back of its list, so a read is a write and a `RwLock`
//! would buy nothing; a `Mutex` has less bookkeeping.
//!
//! ## Guarantees
//!
//! - Writes (`put`, `remove`, `clear`, `prune`) are exclusive in both.
//! - At most one prune runs at a time per cache.
//! - Removal listeners run after the lock is released, so a listener may call
//!   back into the cache that invoked it.
//! - `iter` and `entries` copy the live entries under the lock and return a
//!   snapshot; the lock is not held while the caller iterates.
//!
//! # Example
//!
//! ```
//! use tidecache::{Cache, FifoCache};
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let cache: Arc<FifoCache<String, usize>> = Arc::new(FifoCache::new(1_000, Duration::ZERO));
//!
//! let handles: Vec<_> = (0..4).map(|t| {
//!     let cache = Arc::clone(&cache);
//!     thread::spawn(move || {
//!         for i in 0..100 {
//!             let key = format!("key_{}_{}", t, i);
//!             cache.put(key.clone(), i);
//!             assert_eq!(cache.get(&key), Some(i));
//!         }
//!     })
//! }).collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(cache.len(), 400);
//! ```

pub mod optimistic;
pub mod pessimistic;

pub use optimistic::OptimisticCache;
pub use pessimistic::PessimisticCache;
