//! End-to-end tests for ingestion with provider fetches on the worker path
//!
//! The serving side never calls the provider directly here: the stub fetches
//! run as registered tasks on the in-process queue, and the ingestion service
//! awaits them through the bridge.

use async_trait::async_trait;
use paifu_common::config::TomlConfig;
use paifu_ingest::services::tenhou_client::{FetchError, ProviderClient};
use paifu_ingest::worker::{
    register_provider_tasks, BridgedFetchClient, InProcessQueue, TaskBridge, TaskRegistry,
};
use paifu_ingest::{IngestError, IngestionService, LogOutcome};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

const REF: &str = "2024010521gm-00a9-0000-12ab34cd";
const PAYLOAD: &str = r#"{"name":["Alice","Bob","Carol","Dave"]}"#;
const FEED: &str = "L1|120|2024-01-05 21:00|四鳳南喰赤|---|Alice+30Bob-10Carol-20\n";

/// Worker-side provider stub
struct StubProvider {
    log_body: Option<String>,
    feed: Option<String>,
}

#[async_trait]
impl ProviderClient for StubProvider {
    async fn fetch_log(&self, _ref_code: &str) -> Result<String, FetchError> {
        self.log_body.clone().ok_or(FetchError::Status(500))
    }

    async fn fetch_records(&self, _player_name: &str) -> Result<String, FetchError> {
        self.feed.clone().ok_or(FetchError::Status(500))
    }
}

async fn service_on_worker_path(provider: StubProvider) -> (IngestionService, SqlitePool) {
    let mut registry = TaskRegistry::new();
    register_provider_tasks(&mut registry, Arc::new(provider)).unwrap();

    let queue = Arc::new(InProcessQueue::new(registry));
    let bridge = TaskBridge::new(queue, Duration::from_millis(2));
    let client = Arc::new(BridgedFetchClient::new(bridge));

    let pool = paifu_common::db::connect_memory().await.unwrap();
    let service =
        IngestionService::new(pool.clone(), client, &TomlConfig::default()).unwrap();
    (service, pool)
}

#[tokio::test]
async fn test_log_ingestion_through_the_worker_path() {
    let (service, pool) = service_on_worker_path(StubProvider {
        log_body: Some(PAYLOAD.to_string()),
        feed: None,
    })
    .await;

    let outcome = service.ingest_log(REF, None).await.unwrap();
    assert!(matches!(outcome, LogOutcome::Ingested { .. }));

    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(logs, 1);
}

#[tokio::test]
async fn test_records_ingestion_through_the_worker_path() {
    let (service, pool) = service_on_worker_path(StubProvider {
        log_body: None,
        feed: Some(FEED.to_string()),
    })
    .await;

    let summary = service.ingest_records("Alice").await.unwrap();
    assert_eq!(summary.new_records, 1);

    let records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_records")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(records, 1);
}

#[tokio::test]
async fn test_worker_fetch_failure_surfaces_as_fetch_error() {
    let (service, pool) = service_on_worker_path(StubProvider {
        log_body: None,
        feed: None,
    })
    .await;

    let err = service.ingest_log(REF, None).await.unwrap_err();
    assert!(matches!(err, IngestError::Fetch(FetchError::Remote(_))));

    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(logs, 0);
}
