//! Worker queue contract and in-process implementation
//!
//! The queue is opaque to callers: submit a task by name, then poll the
//! returned handle until it reports completion. Results and worker errors
//! travel as JSON values/strings because the transport between processes is
//! not ours to type.

use crate::worker::registry::TaskRegistry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Opaque identifier for one submitted task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle(pub String);

/// One poll's view of a submitted task
#[derive(Debug, Clone)]
pub enum TaskPoll {
    Pending,
    Done(serde_json::Value),
    Failed(String),
}

/// Queue-level failures (distinct from the task's own outcome)
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("task '{0}' is not registered")]
    UnknownTask(String),

    #[error("unknown task handle: {0}")]
    UnknownHandle(String),

    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Submit-then-poll worker queue
#[async_trait]
pub trait WorkerQueue: Send + Sync {
    /// Hand a task to the queue; returns without waiting for execution
    async fn submit(&self, task: &str, args: serde_json::Value)
        -> Result<TaskHandle, QueueError>;

    /// Non-blocking completion check
    async fn poll(&self, handle: &TaskHandle) -> Result<TaskPoll, QueueError>;
}

enum Slot {
    Pending,
    Finished(crate::worker::registry::TaskResult),
}

/// Queue implementation executing registered tasks on spawned tokio tasks
///
/// Stands in for the external queue in single-process deployments and in
/// tests; the contract it implements is the same one an out-of-process
/// transport would.
pub struct InProcessQueue {
    registry: TaskRegistry,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    next_id: AtomicU64,
}

impl InProcessQueue {
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry,
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl WorkerQueue for InProcessQueue {
    async fn submit(
        &self,
        task: &str,
        args: serde_json::Value,
    ) -> Result<TaskHandle, QueueError> {
        let handler = self
            .registry
            .get(task)
            .ok_or_else(|| QueueError::UnknownTask(task.to_string()))?;

        let id = format!("task-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots.lock().await.insert(id.clone(), Slot::Pending);

        let slots = self.slots.clone();
        let slot_id = id.clone();
        tokio::spawn(async move {
            let result = handler(args).await;
            slots.lock().await.insert(slot_id, Slot::Finished(result));
        });

        Ok(TaskHandle(id))
    }

    async fn poll(&self, handle: &TaskHandle) -> Result<TaskPoll, QueueError> {
        match self.slots.lock().await.get(&handle.0) {
            None => Err(QueueError::UnknownHandle(handle.0.clone())),
            Some(Slot::Pending) => Ok(TaskPoll::Pending),
            Some(Slot::Finished(Ok(value))) => Ok(TaskPoll::Done(value.clone())),
            Some(Slot::Finished(Err(message))) => Ok(TaskPoll::Failed(message.clone())),
        }
    }
}
