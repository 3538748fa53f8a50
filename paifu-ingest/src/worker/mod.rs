//! Worker-queue integration
//!
//! Slow provider fetches and ingestion batches run on out-of-process
//! workers; the request-serving side only gets a non-blocking "is this done
//! yet" poll. This module keeps that arrangement usable from async code:
//!
//! - `queue`: the opaque queue contract (`submit` / `poll`) plus an
//!   in-process implementation backed by spawned tasks.
//! - `registry`: explicit task-name registration, built once at startup;
//!   duplicate names are a fatal configuration error.
//! - `bridge`: turns "submit then poll" into a value callers can await
//!   without blocking the serving loop.
//! - `tasks`: the provider fetches as registered task bodies, plus the
//!   serving-side client that fetches through the bridge.

pub mod bridge;
pub mod queue;
pub mod registry;
pub mod tasks;

pub use bridge::{PendingTask, TaskBridge, TaskError};
pub use queue::{InProcessQueue, QueueError, TaskHandle, TaskPoll, WorkerQueue};
pub use registry::{TaskRegistry, TaskResult};
pub use tasks::{register_provider_tasks, BridgedFetchClient};
