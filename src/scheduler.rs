//! Background dispatch loop pairing waiting tasks with idle workers.

use crate::executor::queue::QueueCore;
use crate::executor::worker::Worker;
use crate::executor::TaskExecutor;
use crate::util::Backoff;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

/// Runs on a dedicated thread for the queue's lifetime.
///
/// Each pass either dispatches waiting work, announces completion, or
/// backs off. Submission and every task completion unpark this thread, so
/// the backoff's parking phase never delays a reaction for long.
pub(crate) fn run(core: Arc<QueueCore>, workers: Vec<Worker>) {
    core.register_scheduler(thread::current());
    debug!(workers = workers.len(), "scheduler running");

    let mut backoff = Backoff::new();

    while core.active.load(Ordering::Acquire) {
        let has_waiting = core.has_waiting.load(Ordering::Acquire);
        let running = core.running.load(Ordering::Acquire);

        if has_waiting && running < core.concurrency {
            if dispatch_pass(&core, &workers) {
                backoff.reset();
                continue;
            }
        } else if running == 0 {
            announce_if_complete(&core);
        }

        backoff.idle();
    }

    debug!("scheduler exiting");
    // dropping the workers here closes their slots and joins each thread,
    // after any in-flight task has finished
}

/// One scan over the worker slots in fixed order. Returns whether any
/// task was handed off.
fn dispatch_pass(core: &Arc<QueueCore>, workers: &[Worker]) -> bool {
    let mut assigned = false;

    for worker in workers {
        if !worker.available() {
            continue;
        }

        let mut waiting = core.waiting.lock();
        let Some(task) = waiting.pop_front() else {
            core.has_waiting.store(false, Ordering::Release);
            break;
        };

        // increment before the handoff: the executor may finish (and
        // decrement) before try_assign even returns
        core.running.fetch_add(1, Ordering::AcqRel);

        match worker.try_assign(TaskExecutor::new(core.clone(), task)) {
            Ok(()) => {
                assigned = true;
                trace!(worker = worker.id(), "task dispatched");

                if waiting.is_empty() {
                    core.has_waiting.store(false, Ordering::Release);
                    break;
                }
                if core.running.load(Ordering::Acquire) >= core.concurrency {
                    break;
                }
            }
            Err(executor) => {
                // defensive: the scheduler is the sole assigner, so this is
                // only reachable while a worker shuts down. The task goes
                // back to the front, nothing lost or duplicated.
                core.running.fetch_sub(1, Ordering::AcqRel);
                waiting.push_front(executor.into_task());
            }
        }
    }

    assigned
}

/// Re-verify empty-and-idle under the queue lock, then broadcast.
///
/// Notifying while holding the same mutex the waiters' predicate reads
/// under rules out a missed wakeup.
fn announce_if_complete(core: &QueueCore) {
    let waiting = core.waiting.lock();
    if waiting.is_empty() && core.running.load(Ordering::Acquire) == 0 {
        core.done.notify_all();
    }
}
