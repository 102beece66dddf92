//! Task representation and the executor wrapper that reports completion.

use super::queue::QueueCore;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task.
///
/// Removal keys on this id: closures carry no value equality, so identity
/// equality is what [`try_remove`](crate::TaskQueue::try_remove) matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A zero-argument unit of work, invoked exactly once.
pub struct Task {
    id: TaskId,
    func: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    /// Wrap a closure as a task.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(f),
        }
    }

    /// The task's unique id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn run(self) {
        (self.func)();
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}

/// Pairs a task with the queue bookkeeping it reports back to.
///
/// The executor holds its own `Arc` to the bookkeeping, so a task still
/// running while the owning queue tears down reports to live state.
pub(crate) struct TaskExecutor {
    core: Arc<QueueCore>,
    task: Task,
}

impl TaskExecutor {
    pub fn new(core: Arc<QueueCore>, task: Task) -> Self {
        Self { core, task }
    }

    /// Recover the task from an executor whose assignment was rejected.
    pub fn into_task(self) -> Task {
        self.task
    }

    /// Run the task, then report completion exactly once.
    ///
    /// A panicking task must not leak the running-count increment, so the
    /// task body runs under `catch_unwind` and the decrement follows
    /// unconditionally.
    pub fn run(self) {
        let Self { core, task } = self;
        let id = task.id();

        if catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
            core.stats.tasks_panicked.fetch_add(1, Ordering::Relaxed);
            warn!(task = ?id, "task panicked");
        }
        core.stats.tasks_executed.fetch_add(1, Ordering::Relaxed);

        core.task_finished();
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("task", &self.task)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn ids_are_unique() {
        let a = Task::new(|| {});
        let b = Task::new(|| {});
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn equality_is_identity() {
        let a = Task::new(|| {});
        let b = Task::new(|| {});
        assert_eq!(a, a);
        assert_ne!(a, b);
    }

    #[test]
    fn run_invokes_closure() {
        let hit = Arc::new(AtomicBool::new(false));
        let flag = hit.clone();
        let task = Task::new(move || flag.store(true, Ordering::SeqCst));
        task.run();
        assert!(hit.load(Ordering::SeqCst));
    }

    #[test]
    fn executor_decrements_running_on_panic() {
        let core = Arc::new(QueueCore::new(1));
        core.running.fetch_add(1, Ordering::AcqRel);

        let exec = TaskExecutor::new(core.clone(), Task::new(|| panic!("boom")));
        exec.run();

        assert_eq!(core.running.load(Ordering::Acquire), 0);
        assert_eq!(core.stats.tasks_panicked.load(Ordering::Relaxed), 1);
        assert_eq!(core.stats.tasks_executed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn executor_decrements_running_on_success() {
        let core = Arc::new(QueueCore::new(1));
        core.running.fetch_add(1, Ordering::AcqRel);

        let exec = TaskExecutor::new(core.clone(), Task::new(|| {}));
        exec.run();

        assert_eq!(core.running.load(Ordering::Acquire), 0);
        assert_eq!(core.stats.tasks_panicked.load(Ordering::Relaxed), 0);
        assert_eq!(core.stats.tasks_executed.load(Ordering::Relaxed), 1);
    }
}
