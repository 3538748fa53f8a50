//! Ingestion services
//!
//! The pure pieces (parser, hash, throttle, reference handling) sit under
//! the orchestrating `IngestionService`, which wires them to the store and
//! the provider client.

pub mod content_hash;
pub mod ingest;
pub mod player_resolver;
pub mod record_parser;
pub mod reference;
pub mod tenhou_client;
pub mod throttle;
