//! Error types for paifu-ingest
//!
//! Two granularities of failure exist side by side: call-level errors
//! (invalid reference, fetch failure, throttle) abort an ingestion and
//! surface to the caller, while `MalformedRecord` is line-scoped and is
//! downgraded to skip-with-warning inside a bulk batch.

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use crate::services::tenhou_client::FetchError;

/// Result type for ingestion operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Ingestion error taxonomy
#[derive(Debug, Error)]
pub enum IngestError {
    /// The supplied reference does not match the provider's pattern; no retry
    #[error("invalid game log reference: {0}")]
    InvalidReference(String),

    /// Transport or payload-shape failure talking to the provider
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// One unparsable line within a bulk feed; skipped, never fatal to a batch
    #[error("malformed record line ({field}): {line}")]
    MalformedRecord { field: &'static str, line: String },

    /// Bulk feed yielded nothing usable and the player has no stored records
    #[error("no records found for player {0}")]
    PlayerNotFound(String),

    /// Bulk check attempted inside the cooldown window
    #[error("player was checked recently at {last_checked}, retry after {retry_at}")]
    Throttled {
        last_checked: DateTime<Utc>,
        retry_at: DateTime<Utc>,
    },

    /// Database operation error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Shared infrastructure error
    #[error(transparent)]
    Common(#[from] paifu_common::Error),
}

impl IngestError {
    /// True when the error is a store-level uniqueness violation.
    ///
    /// The second committer in a duplicate-insert race lands here; callers
    /// treat it as a benign "already exists" rather than a failure.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            IngestError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            IngestError::Common(e) => e.is_unique_violation(),
            _ => false,
        }
    }
}
