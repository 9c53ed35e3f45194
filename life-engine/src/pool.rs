// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Fixed-size worker thread pool
//!
//! A flat FIFO job queue consumed by persistent worker threads, with a single
//! quiescence barrier ([`ThreadPool::wait_for_finish`]). This is not a task
//! graph: jobs carry no results and no dependencies. Callers that need
//! ordering across jobs must provide it themselves, typically by giving each
//! job a disjoint piece of memory to write.
//!
//! Every job runs inside `catch_unwind`. A panicking job does not take its
//! worker down; the panic is counted and reported by the next barrier.

use crate::error::PoolError;
use crate::hardware;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A deferred, type-erased unit of work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for pool construction
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads to spawn
    pub threads: usize,
    /// Prefix for worker thread names (`<prefix>-<index>`)
    pub name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            threads: hardware::default_thread_count(),
            name_prefix: "life-worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Create a configuration with an explicit worker count
    pub fn new(threads: usize) -> Self {
        PoolConfig {
            threads,
            ..PoolConfig::default()
        }
    }

    /// Set the worker thread name prefix
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }
}

/// Counters for monitoring pool activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted by `submit`
    pub submitted: u64,
    /// Jobs that ran to completion
    pub completed: u64,
    /// Jobs that panicked
    pub panicked: u64,
    /// Largest queue length observed at submission time
    pub peak_queue_len: usize,
}

impl PoolStats {
    /// Fraction of finished jobs that panicked, as a percentage
    pub fn failure_rate(&self) -> f64 {
        let finished = self.completed + self.panicked;
        if finished == 0 {
            0.0
        } else {
            (self.panicked as f64 / finished as f64) * 100.0
        }
    }
}

/// Queue and counters, guarded by one mutex
struct QueueState {
    jobs: VecDeque<Job>,
    busy: usize,
    terminate: bool,
    // Panics since the last barrier
    pending_panics: usize,
    first_panic: Option<String>,
    stats: PoolStats,
}

struct Shared {
    state: Mutex<QueueState>,
    has_job: Condvar,
    finished: Condvar,
}

/// Fixed set of persistent worker threads consuming a shared FIFO queue
///
/// # Examples
///
/// ```
/// use life_engine::pool::ThreadPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = ThreadPool::new(4).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let counter = Arc::clone(&counter);
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }).unwrap();
/// }
/// pool.wait_for_finish().unwrap();
/// assert_eq!(counter.load(Ordering::SeqCst), 10);
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    stopped: bool,
}

impl ThreadPool {
    /// Spawn a pool with `threads` workers
    ///
    /// # Panics
    ///
    /// Panics if `threads` is zero.
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::new(threads))
    }

    /// Spawn a pool sized from the detected hardware concurrency
    pub fn with_default_threads() -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::default())
    }

    /// Spawn a pool from an explicit configuration
    ///
    /// # Panics
    ///
    /// Panics if `config.threads` is zero.
    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        assert!(config.threads > 0, "Thread count must be positive");

        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                busy: 0,
                terminate: false,
                pending_panics: 0,
                first_panic: None,
                stats: PoolStats::default(),
            }),
            has_job: Condvar::new(),
            finished: Condvar::new(),
        });

        let mut pool = ThreadPool {
            shared,
            workers: Vec::with_capacity(config.threads),
            stopped: false,
        };

        for index in 0..config.threads {
            let shared = Arc::clone(&pool.shared);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.name_prefix, index))
                .spawn(move || worker_loop(&shared));

            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(source) => {
                    // Workers already running are joined by shutdown
                    pool.shutdown();
                    return Err(PoolError::Spawn { index, source });
                }
            }
        }

        log::debug!("Thread pool started with {} workers", pool.workers.len());
        Ok(pool)
    }

    /// Append a job to the queue and wake one idle worker
    pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.shared.state.lock();
            if state.terminate {
                return Err(PoolError::ShutDown);
            }
            state.jobs.push_back(Box::new(job));
            state.stats.submitted += 1;
            if state.jobs.len() > state.stats.peak_queue_len {
                state.stats.peak_queue_len = state.jobs.len();
            }
        }

        self.shared.has_job.notify_one();
        Ok(())
    }

    /// Block until the queue is empty and no worker is executing a job
    ///
    /// Returns an error if any job panicked since the previous barrier. The
    /// panic counter is reset either way, so the pool stays usable.
    pub fn wait_for_finish(&self) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock();
        while !(state.jobs.is_empty() && state.busy == 0) {
            self.shared.finished.wait(&mut state);
        }

        take_panics(&mut state)
    }

    /// Stop accepting jobs, drain the queue and join every worker
    ///
    /// Jobs already queued still run. Calling this more than once is a no-op.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }

        self.shared.state.lock().terminate = true;
        self.shared.has_job.notify_all();

        for handle in self.workers.drain(..) {
            let name = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                log::error!("Worker {:?} terminated abnormally", name);
            }
        }

        self.stopped = true;
        log::debug!("Thread pool shut down");
    }

    /// Number of live worker threads
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether any job is queued or executing
    pub fn has_pending_work(&self) -> bool {
        let state = self.shared.state.lock();
        !state.jobs.is_empty() || state.busy > 0
    }

    /// Number of jobs waiting in the queue
    pub fn queued_jobs(&self) -> usize {
        self.shared.state.lock().jobs.len()
    }

    /// Whether `shutdown` has run
    pub fn is_shut_down(&self) -> bool {
        self.stopped
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        self.shared.state.lock().stats.clone()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    let mut state = shared.state.lock();
    loop {
        if let Some(job) = state.jobs.pop_front() {
            state.busy += 1;
            // Run unlocked so jobs may block without stalling other workers
            let outcome = MutexGuard::unlocked(&mut state, || {
                panic::catch_unwind(AssertUnwindSafe(job))
            });
            state.busy -= 1;

            match outcome {
                Ok(()) => state.stats.completed += 1,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!(
                        "Job panicked on {}: {}",
                        thread::current().name().unwrap_or("worker"),
                        message
                    );
                    state.stats.panicked += 1;
                    state.pending_panics += 1;
                    state.first_panic.get_or_insert(message);
                }
            }

            shared.finished.notify_all();
        } else if state.terminate {
            break;
        } else {
            shared.has_job.wait(&mut state);
        }
    }
}

fn take_panics(state: &mut QueueState) -> Result<(), PoolError> {
    let count = std::mem::take(&mut state.pending_panics);
    let first_message = state.first_panic.take();
    if count == 0 {
        Ok(())
    } else {
        Err(PoolError::JobsPanicked {
            count,
            first_message: first_message.unwrap_or_default(),
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn run_counting_jobs(pool: &ThreadPool, k: usize) -> usize {
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..k {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.wait_for_finish().unwrap();
        counter.load(Ordering::SeqCst)
    }

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert!(config.threads >= 1);
        assert_eq!(config.name_prefix, "life-worker");
    }

    #[test]
    fn test_pool_config_custom() {
        let config = PoolConfig::new(3).with_name_prefix("band");
        assert_eq!(config.threads, 3);
        assert_eq!(config.name_prefix, "band");
    }

    #[test]
    #[should_panic(expected = "Thread count must be positive")]
    fn test_zero_threads_rejected() {
        let _ = ThreadPool::new(0);
    }

    #[test]
    fn test_thread_count() {
        let pool = ThreadPool::new(3).unwrap();
        assert_eq!(pool.thread_count(), 3);
    }

    #[test]
    fn test_quiescence_zero_jobs() {
        let pool = ThreadPool::new(4).unwrap();
        assert_eq!(run_counting_jobs(&pool, 0), 0);
    }

    #[test]
    fn test_quiescence_one_job() {
        let pool = ThreadPool::new(4).unwrap();
        assert_eq!(run_counting_jobs(&pool, 1), 1);
    }

    #[test]
    fn test_quiescence_hundred_jobs() {
        let pool = ThreadPool::new(4).unwrap();
        assert_eq!(run_counting_jobs(&pool, 100), 100);
        assert!(!pool.has_pending_work());
    }

    #[test]
    fn test_wait_covers_running_job() {
        // The queue drains immediately, the barrier must still wait for the
        // job that is executing
        let pool = ThreadPool::new(1).unwrap();
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        pool.submit(move || {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        pool.wait_for_finish().unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_single_worker_runs_fifo() {
        let pool = ThreadPool::new(1).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..10 {
            let order = Arc::clone(&order);
            pool.submit(move || order.lock().push(i)).unwrap();
        }
        pool.wait_for_finish().unwrap();
        assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_job_is_reported() {
        let pool = ThreadPool::new(2).unwrap();
        pool.submit(|| panic!("band exploded")).unwrap();

        match pool.wait_for_finish() {
            Err(PoolError::JobsPanicked { count, first_message }) => {
                assert_eq!(count, 1);
                assert_eq!(first_message, "band exploded");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // Reported once, then the pool is healthy again
        assert!(pool.wait_for_finish().is_ok());
        assert_eq!(run_counting_jobs(&pool, 20), 20);
        assert_eq!(pool.thread_count(), 2);
    }

    #[test]
    fn test_stats_tracking() {
        let pool = ThreadPool::new(2).unwrap();
        run_counting_jobs(&pool, 5);
        pool.submit(|| panic!("x")).unwrap();
        let _ = pool.wait_for_finish();

        let stats = pool.stats();
        assert_eq!(stats.submitted, 6);
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.panicked, 1);
        assert!(stats.peak_queue_len >= 1);
        assert!((stats.failure_rate() - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut pool = ThreadPool::new(2).unwrap();
        pool.shutdown();
        assert!(pool.is_shut_down());
        assert_eq!(pool.thread_count(), 0);
        pool.shutdown();
        assert!(pool.is_shut_down());
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let mut pool = ThreadPool::new(1).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_submit_after_shutdown() {
        let mut pool = ThreadPool::new(1).unwrap();
        pool.shutdown();
        assert!(matches!(pool.submit(|| {}), Err(PoolError::ShutDown)));
    }

    #[test]
    fn test_worker_thread_names() {
        let pool = ThreadPool::with_config(PoolConfig::new(1).with_name_prefix("band")).unwrap();
        let name = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&name);
        pool.submit(move || *slot.lock() = thread::current().name().map(str::to_owned))
            .unwrap();
        pool.wait_for_finish().unwrap();
        assert_eq!(name.lock().as_deref(), Some("band-0"));
    }

    #[test]
    fn test_concurrent_submitters() {
        let pool = Arc::new(ThreadPool::new(4).unwrap());
        let counter = Arc::new(AtomicUsize::new(0));

        let submitters: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let counter = Arc::clone(&counter);
                        pool.submit(move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in submitters {
            handle.join().unwrap();
        }

        pool.wait_for_finish().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }
}
