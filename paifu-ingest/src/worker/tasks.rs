//! Provider fetches as worker tasks
//!
//! The serving loop must not perform provider I/O itself, so the two fetch
//! shapes run as named tasks on the worker side. `register_provider_tasks`
//! gives a worker registry the task bodies; `BridgedFetchClient` is the
//! serving-side `ProviderClient` that submits those tasks and awaits the
//! fetched text through the bridge. An `IngestionService` built on the
//! bridged client keeps its flows unchanged while every provider call runs
//! out of process.

use crate::services::tenhou_client::{FetchError, ProviderClient};
use crate::worker::bridge::{TaskBridge, TaskError};
use crate::worker::queue::WorkerQueue;
use crate::worker::registry::TaskRegistry;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Task name for the single-log fetch
pub const FETCH_LOG_TASK: &str = "fetch_log";
/// Task name for the bulk records fetch
pub const FETCH_RECORDS_TASK: &str = "fetch_records";

/// Register the provider fetch tasks on a worker-side registry
///
/// Task arguments and results travel as JSON: `fetch_log` takes
/// `{"ref_code": ...}`, `fetch_records` takes `{"player": ...}`, and both
/// return the fetched text. Fetch failures become worker-reported errors
/// carrying the fetch error's message.
pub fn register_provider_tasks(
    registry: &mut TaskRegistry,
    client: Arc<dyn ProviderClient>,
) -> paifu_common::Result<()> {
    let log_client = client.clone();
    registry.register(FETCH_LOG_TASK, move |args| {
        let client = log_client.clone();
        async move {
            let ref_code = args["ref_code"]
                .as_str()
                .ok_or("fetch_log: missing 'ref_code' argument")?
                .to_string();
            let body = client
                .fetch_log(&ref_code)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!(body))
        }
    })?;

    registry.register(FETCH_RECORDS_TASK, move |args| {
        let client = client.clone();
        async move {
            let player = args["player"]
                .as_str()
                .ok_or("fetch_records: missing 'player' argument")?
                .to_string();
            let feed = client
                .fetch_records(&player)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!(feed))
        }
    })?;

    Ok(())
}

/// Provider client that fetches through the worker queue
///
/// `submit` hands the fetch to the queue and returns to the loop at once;
/// the awaited result is the raw text the worker-side task fetched.
/// Worker-reported failures come back as `FetchError::Remote` with the
/// worker's message.
pub struct BridgedFetchClient<Q: WorkerQueue + 'static> {
    bridge: TaskBridge<Q>,
}

impl<Q: WorkerQueue + 'static> BridgedFetchClient<Q> {
    pub fn new(bridge: TaskBridge<Q>) -> Self {
        Self { bridge }
    }

    async fn fetch_text(
        &self,
        task: &str,
        args: serde_json::Value,
    ) -> Result<String, FetchError> {
        match self.bridge.submit(task, args).wait().await {
            Ok(serde_json::Value::String(text)) => Ok(text),
            Ok(other) => Err(FetchError::Remote(format!(
                "task '{}' returned a non-text result: {}",
                task, other
            ))),
            Err(TaskError::Worker(message)) => Err(FetchError::Remote(message)),
            Err(e) => Err(FetchError::Remote(e.to_string())),
        }
    }
}

#[async_trait]
impl<Q: WorkerQueue + 'static> ProviderClient for BridgedFetchClient<Q> {
    async fn fetch_log(&self, ref_code: &str) -> Result<String, FetchError> {
        self.fetch_text(FETCH_LOG_TASK, json!({ "ref_code": ref_code }))
            .await
    }

    async fn fetch_records(&self, player_name: &str) -> Result<String, FetchError> {
        self.fetch_text(FETCH_RECORDS_TASK, json!({ "player": player_name }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider;

    #[async_trait]
    impl ProviderClient for StubProvider {
        async fn fetch_log(&self, ref_code: &str) -> Result<String, FetchError> {
            Ok(format!("{{\"ref\":\"{}\"}}", ref_code))
        }

        async fn fetch_records(&self, _player_name: &str) -> Result<String, FetchError> {
            Err(FetchError::Status(404))
        }
    }

    fn registry() -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        register_provider_tasks(&mut registry, Arc::new(StubProvider)).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_fetch_log_task_returns_the_body() {
        let handler = registry().get(FETCH_LOG_TASK).unwrap();
        let value = handler(json!({"ref_code": "abc"})).await.unwrap();
        assert_eq!(value, json!("{\"ref\":\"abc\"}"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_a_worker_error() {
        let handler = registry().get(FETCH_LOG_TASK).unwrap();
        let err = handler(json!({})).await.unwrap_err();
        assert!(err.contains("ref_code"));
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_a_worker_error() {
        let handler = registry().get(FETCH_RECORDS_TASK).unwrap();
        let err = handler(json!({"player": "Alice"})).await.unwrap_err();
        assert!(err.contains("404"));
    }
}
