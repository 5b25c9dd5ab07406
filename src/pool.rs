//! Fixed-size worker pool for self-spawning work.
//!
//! [`TaskPool`] runs an open-ended stream of work items on a fixed number of
//! threads. Items may submit further items while they execute, so submission
//! never waits for a free worker: jobs go onto rayon's unbounded FIFO
//! injector queue and [`TaskPool::submit`] returns immediately, from any
//! thread, including a worker that is in the middle of a job.
//!
//! ## Completion barrier
//!
//! An outstanding counter is incremented on submit and decremented when a job
//! finishes (normally or by panicking). [`TaskPool::drain`] sleeps on a
//! condition variable until the counter reaches zero. A running job still
//! counts as outstanding while it submits children, so the counter cannot hit
//! zero while work is being published.
//!
//! ```text
//! submit ──► outstanding += 1 ──► FIFO queue ──► worker runs job
//!                                                   │
//!                               outstanding -= 1 ◄──┘ (notify at zero)
//! ```
//!
//! The pool is an explicit value: construct one per run and hand clones to
//! whatever needs to submit work.

use crate::report::{Reporter, TaskError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("failed to start worker threads: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Cloneable handle to a running worker pool.
#[derive(Clone)]
pub struct TaskPool {
    shared: Arc<Shared>,
}

struct Shared {
    workers: rayon::ThreadPool,
    outstanding: AtomicUsize,
    completed: AtomicUsize,
    closed: AtomicBool,
    lock: Mutex<()>,
    idle: Condvar,
    reporter: Reporter,
}

impl Shared {
    fn job_finished(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.idle.notify_all();
        }
    }
}

/// Marks a job complete when dropped, so panics still release the barrier.
struct Completion<'a>(&'a Shared);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.job_finished();
    }
}

impl TaskPool {
    /// Start `worker_count` worker threads.
    ///
    /// A count of 0 lets rayon pick (one thread per logical CPU). Panics
    /// inside jobs are reported through `reporter` as [`TaskError::Panicked`].
    pub fn new(worker_count: usize, reporter: Reporter) -> Result<Self, PoolError> {
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("img-resize-worker-{i}"))
            .build()?;
        debug!("Started {} workers", workers.current_num_threads());

        Ok(Self {
            shared: Arc::new(Shared {
                workers,
                outstanding: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                lock: Mutex::new(()),
                idle: Condvar::new(),
                reporter,
            }),
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.shared.workers.current_num_threads()
    }

    /// Enqueue a job. Never blocks, safe to call from inside a running job.
    ///
    /// Once [`drain`](Self::drain) has released, the pool is closed and late
    /// submissions are dropped with a warning.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shared.closed.load(Ordering::SeqCst) {
            warn!("task submitted after the pool was drained; dropping it");
            return;
        }

        self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        self.shared.workers.spawn_fifo(move || {
            let _done = Completion(&shared);
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                shared
                    .reporter
                    .report(TaskError::Panicked(panic_message(payload.as_ref())));
            }
        });
    }

    /// Jobs submitted but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    /// Jobs finished so far, including ones that failed or panicked.
    pub fn completed(&self) -> usize {
        self.shared.completed.load(Ordering::SeqCst)
    }

    /// Block until no work is outstanding, then close the pool.
    ///
    /// Returns the total number of completed jobs. Worker threads shut down
    /// once the last handle to the pool is dropped.
    pub fn drain(&self) -> usize {
        let mut guard = self.shared.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.shared.outstanding.load(Ordering::SeqCst) > 0 {
            guard = self
                .shared
                .idle
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        self.shared.closed.store(true, Ordering::SeqCst);
        drop(guard);

        let completed = self.completed();
        debug!("Pool drained after {} tasks", completed);
        completed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
