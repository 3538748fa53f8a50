//! Task registration
//!
//! Workers execute tasks by name, so the name → handler table is part of the
//! deployment contract. It is built by explicit `register` calls at startup
//! and immutable once handed to a queue; registering the same name twice is
//! a configuration error severe enough to abort startup.

use futures::future::BoxFuture;
use paifu_common::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// What a task execution produces: a JSON value or a worker-reported error
pub type TaskResult = std::result::Result<serde_json::Value, String>;

/// A registered task body
pub type TaskHandler = Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, TaskResult> + Send + Sync>;

/// Immutable-after-startup task table
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, TaskHandler>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task body under a unique name
    pub fn register<F, Fut>(&mut self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        if self.tasks.contains_key(name) {
            return Err(Error::Config(format!(
                "task '{}' is already registered",
                name
            )));
        }

        self.tasks
            .insert(name.to_string(), Arc::new(move |args| Box::pin(handler(args))));
        tracing::debug!(task = name, "task registered");

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<TaskHandler> {
        self.tasks.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_run() {
        let mut registry = TaskRegistry::new();
        registry
            .register("echo", |args| async move { Ok(args) })
            .unwrap();

        let handler = registry.get("echo").unwrap();
        let result = handler(json!({"x": 1})).await.unwrap();
        assert_eq!(result, json!({"x": 1}));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_name_is_config_error() {
        let mut registry = TaskRegistry::new();
        registry
            .register("echo", |args| async move { Ok(args) })
            .unwrap();

        let err = registry
            .register("echo", |args| async move { Ok(args) })
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(registry.len(), 1);
    }
}
