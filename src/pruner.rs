//! Background Pruning
//!
//! Caches do not own threads. A cache that should be swept periodically is
//! registered with a [`BackgroundPruner`] passed in by the caller:
//!
//! ```text
//!   cache.schedule_prune(pruner, delay)
//!            │
//!            ▼
//!   BackgroundPruner::schedule_repeating(task, delay) ──▶ PruneHandle
//!            │                                              │
//!   task: Weak<cache> ─▶ cache.prune()        cancel_prune_schedule() / drop
//! ```
//!
//! The scheduled task only holds a weak reference to its cache, so a
//! registration never keeps a cache alive. Dropping a cache cancels its
//! registration; cancelling twice, or after the pruner has stopped, is a no-op.
//!
//! [`ThreadPruner`] is the provided implementation: a single named worker thread
//! running every registered task with a fixed delay between runs.

use crate::config::PrunerConfig;
use crate::error::CacheError;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// A task run repeatedly by a [`BackgroundPruner`].
pub type PruneTask = Box<dyn Fn() + Send + Sync>;

/// Identifies one registration with a [`BackgroundPruner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PruneHandle(u64);

impl PruneHandle {
    /// Wraps a pruner-specific identifier.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The identifier this handle wraps.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A scheduler that runs tasks repeatedly with a fixed delay.
pub trait BackgroundPruner: Send + Sync {
    /// Runs `task` every `delay` until the returned handle is cancelled.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidPruneDelay`] for a zero delay, or
    /// [`CacheError::PrunerStopped`] if the pruner no longer accepts tasks.
    fn schedule_repeating(&self, task: PruneTask, delay: Duration) -> Result<PruneHandle, CacheError>;

    /// Stops running the task behind `handle`. Unknown or already cancelled
    /// handles are ignored.
    fn cancel(&self, handle: PruneHandle);
}

struct Scheduled {
    task: Arc<dyn Fn() + Send + Sync>,
    delay: Duration,
    next_run: Instant,
}

struct State {
    tasks: HashMap<u64, Scheduled>,
    next_id: u64,
    running: bool,
}

struct Shared {
    state: Mutex<State>,
    wakeup: Condvar,
}

/// A [`BackgroundPruner`] backed by one worker thread.
///
/// Tasks run outside the scheduler lock, one after another. A task that panics
/// is logged and stays scheduled. The worker stops on [`shutdown`](Self::shutdown)
/// or when the pruner is dropped.
///
/// # Examples
///
/// ```
/// use tidecache::config::PrunerConfig;
/// use tidecache::pruner::ThreadPruner;
/// use tidecache::{Cache, TimedCache};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let pruner = Arc::new(ThreadPruner::start(PrunerConfig::default()).unwrap());
/// let cache: Arc<TimedCache<u32, u32>> = Arc::new(TimedCache::new(Duration::from_millis(50)));
///
/// cache.schedule_prune(pruner.clone(), Duration::from_millis(100)).unwrap();
/// cache.put(1, 1);
/// assert!(cache.cancel_prune_schedule());
/// assert!(!cache.cancel_prune_schedule());
/// ```
pub struct ThreadPruner {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadPruner {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// [`CacheError::PrunerSpawn`] if the thread cannot be created.
    pub fn start(config: PrunerConfig) -> Result<Self, CacheError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                tasks: HashMap::new(),
                next_id: 0,
                running: true,
            }),
            wakeup: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_worker(&worker_shared))?;
        debug!(thread = %config.thread_name, "background pruner started");

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    /// Whether the pruner still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Stops the worker and waits for it to exit. Registered tasks are
    /// discarded. Calling this more than once is harmless.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.running = false;
            state.tasks.clear();
        }
        self.shared.wakeup.notify_all();

        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        // A task that drops the last handle to its own pruner runs on the worker.
        if worker.thread().id() == thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            warn!("background pruner worker panicked");
        }
    }
}

impl BackgroundPruner for ThreadPruner {
    fn schedule_repeating(&self, task: PruneTask, delay: Duration) -> Result<PruneHandle, CacheError> {
        if delay.is_zero() {
            return Err(CacheError::InvalidPruneDelay);
        }
        let mut state = self.shared.state.lock();
        if !state.running {
            return Err(CacheError::PrunerStopped);
        }
        let id = state.next_id;
        state.next_id += 1;
        state.tasks.insert(
            id,
            Scheduled {
                task: Arc::from(task),
                delay,
                next_run: Instant::now() + delay,
            },
        );
        drop(state);

        self.shared.wakeup.notify_one();
        Ok(PruneHandle(id))
    }

    fn cancel(&self, handle: PruneHandle) {
        self.shared.state.lock().tasks.remove(&handle.0);
    }
}

impl Drop for ThreadPruner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadPruner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ThreadPruner")
            .field("tasks", &state.tasks.len())
            .field("running", &state.running)
            .finish()
    }
}

fn run_worker(shared: &Shared) {
    let mut state = shared.state.lock();
    while state.running {
        let now = Instant::now();
        let due: Vec<(u64, Arc<dyn Fn() + Send + Sync>)> = state
            .tasks
            .iter()
            .filter(|(_, scheduled)| scheduled.next_run <= now)
            .map(|(&id, scheduled)| (id, Arc::clone(&scheduled.task)))
            .collect();

        if due.is_empty() {
            match state.tasks.values().map(|scheduled| scheduled.next_run).min() {
                Some(deadline) => {
                    shared.wakeup.wait_until(&mut state, deadline);
                }
                None => shared.wakeup.wait(&mut state),
            }
            continue;
        }

        MutexGuard::unlocked(&mut state, || {
            for (id, task) in &due {
                if panic::catch_unwind(AssertUnwindSafe(|| task())).is_err() {
                    warn!(task = id, "background prune task panicked");
                }
            }
        });

        let finished = Instant::now();
        for (id, _) in due {
            if let Some(scheduled) = state.tasks.get_mut(&id) {
                scheduled.next_run = finished + scheduled.delay;
            }
        }
    }
    debug!("background pruner stopped");
}

/// A cache's registration with a pruner, cancelled on drop.
#[derive(Default)]
pub(crate) struct PruneSchedule {
    slot: Mutex<Option<(Arc<dyn BackgroundPruner>, PruneHandle)>>,
}

impl PruneSchedule {
    /// Registers a task that prunes `target` every `delay` for as long as
    /// `target` is alive, replacing any earlier registration.
    pub(crate) fn start<T>(
        &self,
        target: &Arc<T>,
        pruner: Arc<dyn BackgroundPruner>,
        delay: Duration,
        prune: fn(&T),
    ) -> Result<(), CacheError>
    where
        T: Send + Sync + 'static,
    {
        let weak: Weak<T> = Arc::downgrade(target);
        let task: PruneTask = Box::new(move || {
            if let Some(target) = weak.upgrade() {
                prune(&target);
            }
        });
        let handle = pruner.schedule_repeating(task, delay)?;

        let previous = self.slot.lock().replace((pruner, handle));
        if let Some((pruner, handle)) = previous {
            pruner.cancel(handle);
        }
        Ok(())
    }

    /// Cancels the registration. Returns `false` if there was none.
    pub(crate) fn cancel(&self) -> bool {
        let current = self.slot.lock().take();
        match current {
            Some((pruner, handle)) => {
                pruner.cancel(handle);
                true
            }
            None => false,
        }
    }
}

impl Drop for PruneSchedule {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for PruneSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handle = self.slot.lock().as_ref().map(|(_, handle)| *handle);
        f.debug_struct("PruneSchedule").field("handle", &handle).finish()
    }
}
