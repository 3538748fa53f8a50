//! paifu-ingest: match-history ingestion service
//!
//! Pulls game logs and bulk per-player record feeds from the Tenhou
//! provider, parses them into domain entities, dedups against the store and
//! persists transactionally. Designed to be driven from request-handling
//! code: slow work can be pushed through the worker bridge so the serving
//! loop never blocks on the provider.

pub mod db;
pub mod error;
pub mod services;
pub mod worker;

pub use crate::error::{FetchError, IngestError, IngestResult};
pub use crate::services::ingest::{IngestOutcome, IngestionService, LogOutcome, RecordsSummary};
