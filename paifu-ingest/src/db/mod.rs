//! Entity persistence for paifu-ingest
//!
//! Pool and schema initialization live in `paifu_common::db`; these modules
//! cover the ingest tables. Entities are written once and never mutated
//! afterwards, with one exception: a player's `last_checked_at` throttle
//! timestamp.

pub mod game_logs;
pub mod game_records;
pub mod players;
