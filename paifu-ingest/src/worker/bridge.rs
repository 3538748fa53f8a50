//! Awaitable bridge over a poll-only worker queue
//!
//! The serving loop must never block on a background computation, but the
//! queue only offers "submit, then ask again later". `TaskBridge::submit`
//! hands the task off and returns a `PendingTask` immediately; a spawned
//! poller checks the queue on a fixed interval and resolves the pending
//! value through a oneshot channel. Callers just await, the loop keeps
//! turning.
//!
//! The bridge enforces no deadline of its own; a caller that needs one can
//! wrap `wait()` in a timeout. Dropping the `PendingTask` abandons the wait
//! and stops the poller, but the task already handed to the queue keeps
//! running to completion on the worker side.

use crate::worker::queue::{QueueError, TaskPoll, WorkerQueue};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

/// Bridge-level failures surfaced to the awaiting caller
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// The worker ran the task and reported an error
    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("bridge poller stopped before completion")]
    Lost,
}

/// Awaitable handle for one submitted task
pub struct PendingTask {
    rx: oneshot::Receiver<Result<serde_json::Value, TaskError>>,
}

impl PendingTask {
    /// Await the task's result
    pub async fn wait(self) -> Result<serde_json::Value, TaskError> {
        self.rx.await.unwrap_or(Err(TaskError::Lost))
    }
}

/// Adapter from a cooperative serving loop to the worker queue
pub struct TaskBridge<Q: WorkerQueue + 'static> {
    queue: Arc<Q>,
    poll_interval: Duration,
}

impl<Q: WorkerQueue + 'static> TaskBridge<Q> {
    pub fn new(queue: Arc<Q>, poll_interval: Duration) -> Self {
        Self {
            queue,
            poll_interval,
        }
    }

    /// Submit a task and get an awaitable for its result
    ///
    /// Returns immediately; submission and polling happen on a spawned task.
    pub fn submit(&self, task: &str, args: serde_json::Value) -> PendingTask {
        let (tx, rx) = oneshot::channel();
        let queue = self.queue.clone();
        let task = task.to_string();
        let interval = self.poll_interval;

        tokio::spawn(async move {
            let handle = match queue.submit(&task, args).await {
                Ok(handle) => handle,
                Err(e) => {
                    let _ = tx.send(Err(TaskError::Queue(e)));
                    return;
                }
            };

            loop {
                match queue.poll(&handle).await {
                    Ok(TaskPoll::Pending) => {
                        if tx.is_closed() {
                            tracing::debug!(task = %task, "caller stopped awaiting, abandoning poll");
                            return;
                        }
                        tokio::time::sleep(interval).await;
                    }
                    Ok(TaskPoll::Done(value)) => {
                        let _ = tx.send(Ok(value));
                        return;
                    }
                    Ok(TaskPoll::Failed(message)) => {
                        let _ = tx.send(Err(TaskError::Worker(message)));
                        return;
                    }
                    Err(e) => {
                        let _ = tx.send(Err(TaskError::Queue(e)));
                        return;
                    }
                }
            }
        });

        PendingTask { rx }
    }
}
