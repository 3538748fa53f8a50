//! Shared foundation for the paifu workspace
//!
//! Carries the pieces every paifu service needs: the common error type,
//! configuration loading, and database pool/schema initialization.

pub mod config;
pub mod db;
pub mod error;

pub use crate::error::{Error, Result};
