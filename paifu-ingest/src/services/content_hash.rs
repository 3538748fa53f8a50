//! Content fingerprinting for record dedup
//!
//! A stored record line is identified by the SHA-256 of its trimmed bytes.
//! Surrounding whitespace varies between provider responses for the same
//! game, so it is excluded; everything else participates in the hash.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 over the trimmed line
pub fn content_hash(line: &str) -> String {
    format!("{:x}", Sha256::digest(line.trim().as_bytes()))
}
