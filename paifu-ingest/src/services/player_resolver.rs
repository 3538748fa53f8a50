//! Player identity resolution
//!
//! Maps display names to persistent player identities, creating missing ones
//! on first sight. Two strategies:
//!
//! - `resolve`: immediate get-or-create for a single name, committed right
//!   away. Used when a later step depends on the identity's id.
//! - `resolve_batch`: one `IN` lookup for the whole name set, one multi-row
//!   insert for the missing ones, one commit, then a re-select so every name
//!   maps to exactly one identity. Used by bulk ingestion to avoid N round
//!   trips and to share newly created identities across all occurrences
//!   within the batch.
//!
//! The cache lives on the resolver instance and a resolver is constructed
//! per ingestion call, so identities are shared within one batch but never
//! across concurrent batches. The unique index on `players.name` remains the
//! authoritative guard; after any insert the stored row is re-read, so a
//! lost race still resolves to the surviving identity.

use crate::db::players::{self, Player};
use paifu_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Session-scoped name → identity resolver
pub struct PlayerResolver {
    db: SqlitePool,
    cache: HashMap<String, Player>,
}

impl PlayerResolver {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            cache: HashMap::new(),
        }
    }

    /// Get or create one identity, committing immediately
    pub async fn resolve(&mut self, name: &str) -> Result<Player> {
        if let Some(player) = self.cache.get(name) {
            return Ok(player.clone());
        }

        if players::find_by_name(&self.db, name).await?.is_none() {
            players::insert_ignore(&self.db, &Player::new(name)).await?;
            tracing::debug!(name, "created player");
        }

        let stored = players::find_by_name(&self.db, name)
            .await?
            .ok_or_else(|| Error::Internal(format!("player {} missing after insert", name)))?;

        self.cache.insert(name.to_string(), stored.clone());
        Ok(stored)
    }

    /// Resolve a set of names in one round trip per phase
    ///
    /// Returns a map covering every requested name. Duplicate input names are
    /// collapsed; repeated names across a batch resolve to the same identity
    /// even when none of them existed before the batch began.
    pub async fn resolve_batch(&mut self, names: &[String]) -> Result<HashMap<String, Player>> {
        let mut wanted: Vec<String> = Vec::new();
        for name in names {
            if !self.cache.contains_key(name) && !wanted.contains(name) {
                wanted.push(name.clone());
            }
        }

        if !wanted.is_empty() {
            for player in players::find_by_names(&self.db, &wanted).await? {
                self.cache.insert(player.name.clone(), player);
            }

            let missing: Vec<Player> = wanted
                .iter()
                .filter(|name| !self.cache.contains_key(*name))
                .map(|name| Player::new(name.clone()))
                .collect();

            if !missing.is_empty() {
                players::insert_many_ignore(&self.db, &missing).await?;

                // Authoritative re-select: rows created concurrently by
                // another batch win over our candidates
                let missing_names: Vec<String> =
                    missing.iter().map(|p| p.name.clone()).collect();
                for player in players::find_by_names(&self.db, &missing_names).await? {
                    self.cache.insert(player.name.clone(), player);
                }
            }
        }

        let mut resolved = HashMap::new();
        for name in names {
            let player = self
                .cache
                .get(name)
                .ok_or_else(|| Error::Internal(format!("player {} missing after batch", name)))?;
            resolved.insert(name.clone(), player.clone());
        }

        Ok(resolved)
    }
}
