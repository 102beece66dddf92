//! Task execution infrastructure.
//!
//! This module provides the queue's moving parts: the task
//! representation, the per-slot worker threads, the executor wrapper that
//! reports completion, and the public [`TaskQueue`] handle.

pub mod queue;
pub mod task;
pub mod worker;

pub use queue::{QueueStats, TaskQueue};
pub use task::{Task, TaskId};

pub(crate) use task::TaskExecutor;
