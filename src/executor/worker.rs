// worker slot: one dispatch thread, at most one task at a time
use super::task::TaskExecutor;
use crate::config::Config;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub(crate) type WorkerId = usize;

pub(crate) struct Worker {
    id: WorkerId,
    busy: Arc<AtomicBool>,
    // bounded(1): the slot holds at most the one executor being handed over
    slot: Option<Sender<TaskExecutor>>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(id: WorkerId, config: &Config) -> Result<Self> {
        let (slot, jobs) = bounded::<TaskExecutor>(1);
        let busy = Arc::new(AtomicBool::new(false));

        let name = format!("{}-{}", config.thread_name_prefix, id);
        let mut builder = thread::Builder::new().name(name);
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let busy_flag = busy.clone();
        let thread = builder
            .spawn(move || Self::run(jobs, busy_flag))
            .map_err(|e| Error::spawn(format!("worker {id}: {e}")))?;

        Ok(Self {
            id,
            busy,
            slot: Some(slot),
            thread: Some(thread),
        })
    }

    // main loop: runs until the sending half closes
    fn run(jobs: Receiver<TaskExecutor>, busy: Arc<AtomicBool>) {
        while let Ok(executor) = jobs.recv() {
            executor.run();
            busy.store(false, Ordering::Release);
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// True only while no task is assigned or running here.
    pub fn available(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Atomically move idle -> busy and hand the executor to the worker
    /// thread. A rejected executor is returned so its task can go back to
    /// the front of the queue.
    pub fn try_assign(&self, executor: TaskExecutor) -> std::result::Result<(), TaskExecutor> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(executor);
        }

        let Some(slot) = self.slot.as_ref() else {
            self.busy.store(false, Ordering::Release);
            return Err(executor);
        };

        match slot.try_send(executor) {
            Ok(()) => Ok(()),
            // only reachable once the worker is shutting down
            Err(TrySendError::Full(executor)) | Err(TrySendError::Disconnected(executor)) => {
                self.busy.store(false, Ordering::Release);
                Err(executor)
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // closing the slot lets the thread drain its last job and exit
        self.slot.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
