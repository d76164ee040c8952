//! Configuration for the thread-backed background pruner.
//!
//! # Examples
//!
//! ```
//! use tidecache::config::PrunerConfig;
//! use tidecache::pruner::ThreadPruner;
//!
//! let pruner = ThreadPruner::start(PrunerConfig::default().with_thread_name("session-pruner"))
//!     .expect("spawn pruner thread");
//! pruner.shutdown();
//! ```

use std::fmt;

/// Configuration for [`ThreadPruner`](crate::pruner::ThreadPruner).
#[derive(Clone, PartialEq, Eq)]
pub struct PrunerConfig {
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl PrunerConfig {
    /// Sets the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for PrunerConfig {
    fn default() -> Self {
        Self {
            thread_name: String::from("cache-pruner"),
        }
    }
}

impl fmt::Debug for PrunerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrunerConfig")
            .field("thread_name", &self.thread_name)
            .finish()
    }
}
