//! Execution contexts for dispatch callbacks
//!
//! The dispatcher never calls a callback itself when responses are handled
//! on the calling context; it hands a [`Task`] to an [`Executor`] that
//! represents that context. Three executors are provided:
//!
//! - [`InlineExecutor`] runs tasks immediately, on whatever thread calls it.
//! - [`TaskQueue`] collects tasks for its owner to drain, the way a UI event
//!   loop would.
//! - [`RuntimeExecutor`] spawns tasks onto a tokio runtime.

use std::fmt;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A callback waiting to be run
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run callbacks on a particular context
pub trait Executor: Send + Sync {
    /// Run `task` on this executor's context
    fn run(&self, task: Task);
}

/// Runs every task immediately on the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn run(&self, task: Task) {
        task()
    }
}

/// A queue of tasks drained by the context that owns it
///
/// Hand [`executor`](TaskQueue::executor) handles to dispatchers; tasks they
/// schedule run only when the owner calls [`run_pending`](TaskQueue::run_pending)
/// or [`run_next`](TaskQueue::run_next).
pub struct TaskQueue {
    sender: UnboundedSender<Task>,
    receiver: UnboundedReceiver<Task>,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// Get an executor that enqueues onto this queue
    pub fn executor(&self) -> QueueExecutor {
        QueueExecutor {
            sender: self.sender.clone(),
        }
    }

    /// Run every task already queued, returning how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next task and return it without running it
    pub async fn next_task(&mut self) -> Option<Task> {
        self.receiver.recv().await
    }

    /// Wait for the next task and run it on the current thread
    ///
    /// The queue keeps a sender of its own, so this waits until some
    /// executor schedules work.
    pub async fn run_next(&mut self) -> bool {
        match self.next_task().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").finish_non_exhaustive()
    }
}

/// Executor handle for a [`TaskQueue`]
#[derive(Clone)]
pub struct QueueExecutor {
    sender: UnboundedSender<Task>,
}

impl Executor for QueueExecutor {
    fn run(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!("task queue dropped; discarding callback");
        }
    }
}

impl fmt::Debug for QueueExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueExecutor")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Spawns tasks onto a tokio runtime
#[derive(Debug, Clone)]
pub struct RuntimeExecutor {
    handle: Handle,
}

impl RuntimeExecutor {
    /// Spawn onto the runtime behind `handle`
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Spawn onto the runtime this is called from
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Executor for RuntimeExecutor {
    fn run(&self, task: Task) {
        self.handle.spawn(async move { task() });
    }
}
