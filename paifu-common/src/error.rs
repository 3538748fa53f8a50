//! Common error types for paifu services

use thiserror::Error;

/// Common result type for paifu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across paifu crates
#[derive(Error, Debug)]
pub enum Error {
    /// Store operation failure (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the underlying cause is a store-level uniqueness violation.
    ///
    /// The unique indexes on player names, reference codes and content hashes
    /// are the authoritative guard against duplicate rows; callers use this to
    /// fold a lost insert race into an "already exists" outcome.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
