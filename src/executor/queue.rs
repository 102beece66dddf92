//! The queue primitive: shared bookkeeping plus the public handle.

use super::task::{Task, TaskId};
use super::worker::Worker;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Execution counters, incremented by task executors.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub tasks_executed: AtomicU64,
    pub tasks_panicked: AtomicU64,
}

/// Snapshot of the queue's execution counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueStats {
    /// Tasks run to completion, panicked ones included.
    pub tasks_executed: u64,
    /// Tasks whose body panicked.
    pub tasks_panicked: u64,
}

/// Bookkeeping shared between the queue handle, the scheduler and every
/// in-flight task executor.
///
/// All waiting-queue state lives under the one mutex; `has_waiting` is an
/// eventually-consistent hint, never the source of truth. The completion
/// condvar pairs with that same mutex, so announcing completion and
/// checking the wait predicate happen under one lock.
pub(crate) struct QueueCore {
    pub waiting: Mutex<VecDeque<Task>>,
    pub done: Condvar,
    pub running: AtomicUsize,
    pub has_waiting: AtomicBool,
    pub active: AtomicBool,
    pub concurrency: usize,
    pub stats: Stats,
    // unparker for the scheduler thread, registered from inside its loop
    scheduler: OnceLock<thread::Thread>,
}

impl QueueCore {
    pub fn new(concurrency: usize) -> Self {
        Self {
            waiting: Mutex::new(VecDeque::new()),
            done: Condvar::new(),
            running: AtomicUsize::new(0),
            has_waiting: AtomicBool::new(false),
            active: AtomicBool::new(true),
            concurrency,
            stats: Stats::default(),
            scheduler: OnceLock::new(),
        }
    }

    pub fn register_scheduler(&self, thread: thread::Thread) {
        let _ = self.scheduler.set(thread);
    }

    pub fn wake_scheduler(&self) {
        if let Some(thread) = self.scheduler.get() {
            thread.unpark();
        }
    }

    /// Completion report from a task executor: the sole decrement site.
    pub fn task_finished(&self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
        self.wake_scheduler();
    }
}

/// A fixed-concurrency FIFO task queue.
///
/// Tasks submitted from any number of threads are started in submission
/// order by a background scheduler, across `concurrency` worker threads
/// each running at most one task at a time. [`wait`](TaskQueue::wait)
/// blocks until everything submitted has finished.
///
/// Dropping the queue discards tasks that have not started, stops the
/// scheduler, and lets in-flight tasks run to completion.
pub struct TaskQueue {
    core: Arc<QueueCore>,
    scheduler: Option<JoinHandle<()>>,
}

impl TaskQueue {
    /// Build a queue sized to the host's logical CPU count.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Build a queue with an explicit concurrency level.
    pub fn with_concurrency(concurrency: usize) -> Result<Self> {
        Self::with_config(Config::builder().num_threads(concurrency).build()?)
    }

    /// Build a queue from a full configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let concurrency = config.worker_threads();

        let core = Arc::new(QueueCore::new(concurrency));

        let workers = (0..concurrency)
            .map(|id| Worker::spawn(id, &config))
            .collect::<Result<Vec<_>>>()?;

        let scheduler_core = core.clone();
        let scheduler = thread::Builder::new()
            .name(format!("{}-scheduler", config.thread_name_prefix))
            .spawn(move || scheduler::run(scheduler_core, workers))
            .map_err(|e| Error::spawn(format!("scheduler: {e}")))?;

        debug!(concurrency, "task queue started");

        Ok(Self {
            core,
            scheduler: Some(scheduler),
        })
    }

    /// Append a task to the back of the waiting queue.
    ///
    /// Returns the task's id, usable with [`try_remove`](Self::try_remove).
    pub fn enqueue(&self, task: Task) -> TaskId {
        let id = task.id();
        {
            let mut waiting = self.core.waiting.lock();
            waiting.push_back(task);
            self.core.has_waiting.store(true, Ordering::Release);
        }
        self.core.wake_scheduler();
        id
    }

    /// Construct a task from a closure in place and enqueue it.
    pub fn enqueue_fn<F>(&self, f: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Task::new(f))
    }

    /// Append a batch of tasks, preserving their relative order.
    pub fn enqueue_all<I>(&self, tasks: I) -> Vec<TaskId>
    where
        I: IntoIterator<Item = Task>,
    {
        let ids = {
            let mut waiting = self.core.waiting.lock();
            let ids: Vec<TaskId> = tasks
                .into_iter()
                .map(|task| {
                    let id = task.id();
                    waiting.push_back(task);
                    id
                })
                .collect();
            if !waiting.is_empty() {
                self.core.has_waiting.store(true, Ordering::Release);
            }
            ids
        };
        self.core.wake_scheduler();
        ids
    }

    /// Remove the first still-waiting task with the given id.
    ///
    /// Returns false for tasks already handed to a worker, already
    /// finished, or never enqueued — dispatched work cannot be cancelled
    /// through this interface.
    pub fn try_remove(&self, id: TaskId) -> bool {
        let mut waiting = self.core.waiting.lock();
        let Some(pos) = waiting.iter().position(|task| task.id() == id) else {
            return false;
        };
        waiting.remove(pos);
        if waiting.is_empty() {
            self.core.has_waiting.store(false, Ordering::Release);
            drop(waiting);
            // the queue may just have become complete
            self.core.wake_scheduler();
        }
        true
    }

    /// Discard every waiting task. In-flight tasks are unaffected.
    pub fn clear(&self) {
        {
            let mut waiting = self.core.waiting.lock();
            waiting.clear();
            self.core.has_waiting.store(false, Ordering::Release);
        }
        self.core.wake_scheduler();
    }

    /// The worker-pool size.
    pub fn concurrency(&self) -> usize {
        self.core.concurrency
    }

    /// Whether the waiting queue is empty, from the O(1) hint flag.
    pub fn empty(&self) -> bool {
        !self.core.has_waiting.load(Ordering::Acquire)
    }

    /// Exact number of waiting tasks.
    pub fn waiting(&self) -> usize {
        self.core.waiting.lock().len()
    }

    /// Number of currently running tasks.
    pub fn running(&self) -> usize {
        self.core.running.load(Ordering::Acquire)
    }

    /// Whether every worker is occupied.
    pub fn busy(&self) -> bool {
        self.running() >= self.core.concurrency
    }

    /// Whether nothing is waiting and nothing is running.
    pub fn complete(&self) -> bool {
        let waiting = self.core.waiting.lock();
        waiting.is_empty() && self.core.running.load(Ordering::Acquire) == 0
    }

    /// Block the calling thread until all submitted work has finished.
    ///
    /// Re-checks the completion predicate on every wake. Blocks
    /// indefinitely if a task never returns.
    pub fn wait(&self) {
        let mut waiting = self.core.waiting.lock();
        while !(waiting.is_empty() && self.core.running.load(Ordering::Acquire) == 0) {
            self.core.done.wait(&mut waiting);
        }
    }

    /// Snapshot of the execution counters.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            tasks_executed: self.core.stats.tasks_executed.load(Ordering::Relaxed),
            tasks_panicked: self.core.stats.tasks_panicked.load(Ordering::Relaxed),
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        // not-yet-started tasks are discarded, in-flight ones finish
        self.clear();
        self.core.active.store(false, Ordering::Release);
        self.core.wake_scheduler();
        if let Some(scheduler) = self.scheduler.take() {
            let _ = scheduler.join();
        }
        debug!("task queue stopped");
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("concurrency", &self.concurrency())
            .field("waiting", &self.waiting())
            .field("running", &self.running())
            .finish()
    }
}
