//! Conveyor - a fixed-concurrency FIFO task queue.
//!
//! Callers submit zero-argument tasks from any number of threads; a
//! background scheduler starts them in submission order across a fixed
//! pool of worker threads, and `wait()` blocks until everything submitted
//! has finished.
//!
//! # Quick Start
//!
//! ```no_run
//! use conveyor::TaskQueue;
//!
//! let queue = TaskQueue::with_concurrency(4).unwrap();
//!
//! for i in 0..16 {
//!     queue.enqueue_fn(move || {
//!         println!("task {i}");
//!     });
//! }
//!
//! // blocks until all 16 tasks have run
//! queue.wait();
//! ```
//!
//! # Guarantees
//!
//! - Tasks are *started* in strict FIFO submission order; completion
//!   order of running tasks is unconstrained.
//! - At most `concurrency` tasks run at any instant.
//! - A still-waiting task can be withdrawn with
//!   [`try_remove`](TaskQueue::try_remove); dispatched work cannot.
//! - A panicking task is contained and counted, never wedging the pool.
//! - Dropping the queue discards not-yet-started tasks, waits for the
//!   scheduler to stop, and lets in-flight tasks finish.

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod util;

mod scheduler;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{QueueStats, Task, TaskId, TaskQueue};
