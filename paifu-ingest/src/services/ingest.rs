//! Ingestion orchestration
//!
//! Two entry flows against the same store:
//!
//! - `ingest_log`: one game log keyed by reference code:
//!   validate → check existing → fetch → persist (one transaction).
//! - `ingest_records`: a player's bulk feed: resolve owner → throttle check
//!   → fetch → parse and dedup per line → resolve all participants in one
//!   batch → persist the batch (one transaction).
//!
//! Failure granularity is deliberate: reference validation, fetch and
//! throttle failures abort the call, while a malformed line inside a feed is
//! logged and skipped so one bad line cannot discard the rest of the batch.
//! Store-level unique indexes are the final dedup arbiter; a lost insert
//! race is folded into the corresponding "already exists" outcome rather
//! than surfaced as a failure.

use crate::db::{game_logs, game_records, players};
use crate::error::{IngestError, IngestResult};
use crate::services::content_hash::content_hash;
use crate::services::player_resolver::PlayerResolver;
use crate::services::record_parser::{ParsedRecord, RecordParser};
use crate::services::reference::{GameRef, ReferencePattern};
use crate::services::tenhou_client::{LogPayload, ProviderClient};
use crate::services::throttle::ThrottleGate;
use chrono::Utc;
use paifu_common::config::TomlConfig;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Terminal state of a single-log ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    /// A new log was stored
    Ingested { log_id: Uuid },
    /// A log with this reference already exists; nothing was fetched/stored
    AlreadyIngested,
}

/// Terminal state of a bulk-records ingestion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordsSummary {
    /// New records stored by this call
    pub new_records: usize,
    /// Lines skipped because their hash was already stored (or repeated
    /// within the feed)
    pub duplicates: usize,
    /// Lines skipped as unparsable
    pub malformed: usize,
}

/// Uniform result shape handed to the calling layer
///
/// The error taxonomy stays internal; callers get a flag and an actionable
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub ok: bool,
    pub message: String,
}

/// Match-history ingestion service
///
/// Holds the connection pool and the provider client; each call runs its own
/// units of work against the pool, so one service value can serve overlapping
/// calls.
pub struct IngestionService {
    db: SqlitePool,
    client: Arc<dyn ProviderClient>,
    parser: RecordParser,
    reference: ReferencePattern,
    throttle: ThrottleGate,
}

impl IngestionService {
    pub fn new(
        db: SqlitePool,
        client: Arc<dyn ProviderClient>,
        config: &TomlConfig,
    ) -> paifu_common::Result<Self> {
        Ok(Self {
            db,
            client,
            parser: RecordParser::new(&config.provider)?,
            reference: ReferencePattern::new(&config.provider.ref_pattern)?,
            throttle: ThrottleGate::from_hours(config.ingest.check_cooldown_hours),
        })
    }

    /// Ingest one game log by reference
    pub async fn ingest_log(
        &self,
        raw_ref: &str,
        upload_user_id: Option<Uuid>,
    ) -> IngestResult<LogOutcome> {
        // Validate
        let code = self
            .reference
            .normalize(raw_ref)
            .ok_or_else(|| IngestError::InvalidReference(raw_ref.to_string()))?;
        let gref = GameRef::parse(&code)
            .ok_or_else(|| IngestError::InvalidReference(raw_ref.to_string()))?;

        // Check existing before spending a fetch
        if game_logs::find_by_ref(&self.db, &code).await?.is_some() {
            tracing::info!(ref_code = %code, "game log already stored");
            return Ok(LogOutcome::AlreadyIngested);
        }

        // Fetch
        let body = self.client.fetch_log(&code).await?;
        let payload = LogPayload::parse(&body)?;

        // Persist: identities first (idempotent upserts), then the log and
        // its join rows as one transaction
        let mut resolver = PlayerResolver::new(self.db.clone());
        let identities = resolver.resolve_batch(&payload.player_names).await?;

        let log = game_logs::GameLog {
            guid: Uuid::new_v4(),
            ref_code: code.clone(),
            upload_user_id,
            upload_time: Utc::now(),
            play_time: gref.play_time,
            lobby: gref.lobby,
            rule_code: gref.rule_code,
            payload: body,
        };

        let mut participants: Vec<(Uuid, i64)> = Vec::new();
        for (seat, name) in payload.player_names.iter().enumerate() {
            let guid = identities[name].guid;
            // A name can repeat in odd payloads; the first seat wins
            if !participants.iter().any(|(id, _)| *id == guid) {
                participants.push((guid, seat as i64));
            }
        }

        match game_logs::insert_with_players(&self.db, &log, &participants).await {
            Ok(()) => Ok(LogOutcome::Ingested { log_id: log.guid }),
            Err(e) if e.is_unique_violation() => {
                // Lost the race to a concurrent ingestion of the same ref
                tracing::info!(ref_code = %code, "game log stored concurrently");
                Ok(LogOutcome::AlreadyIngested)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ingest a player's bulk record feed
    pub async fn ingest_records(&self, player_name: &str) -> IngestResult<RecordsSummary> {
        let now = Utc::now();

        // The owner identity is needed before anything else; committed
        // immediately so its id exists for the throttle update
        let mut resolver = PlayerResolver::new(self.db.clone());
        let owner = resolver.resolve(player_name).await?;

        // Throttle check, then refresh the timestamp in its own unit of work
        // so a slow fetch failure later does not re-arm the gate
        if !self.throttle.allow(owner.last_checked_at, now) {
            let last_checked = owner.last_checked_at.unwrap_or(now);
            return Err(IngestError::Throttled {
                last_checked,
                retry_at: self.throttle.retry_at(last_checked),
            });
        }
        players::touch_last_checked(&self.db, owner.guid, now).await?;

        // Fetch
        let feed = self.client.fetch_records(player_name).await?;

        // Parse and dedup line by line; malformed lines are logged and
        // skipped, never fatal to the batch
        let mut summary = RecordsSummary::default();
        let mut seen_hashes: HashSet<String> = HashSet::new();
        let mut parsed: Vec<ParsedRecord> = Vec::new();

        for line in feed.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let hash = content_hash(line);
            if !seen_hashes.insert(hash.clone()) {
                summary.duplicates += 1;
                continue;
            }
            if game_records::hash_exists(&self.db, &hash).await? {
                summary.duplicates += 1;
                continue;
            }

            match self.parser.parse(line) {
                Ok(record) => parsed.push(record),
                Err(e) => {
                    tracing::warn!(error = %e, line, "skipping malformed record line");
                    summary.malformed += 1;
                }
            }
        }

        if parsed.is_empty() {
            let existing = players::record_count(&self.db, owner.guid).await?;
            if existing == 0 && summary.duplicates == 0 {
                return Err(IngestError::PlayerNotFound(player_name.to_string()));
            }
            return Ok(summary);
        }

        // Resolve the union of participant names across the batch in one go
        let names: Vec<String> = {
            let mut distinct: Vec<String> = Vec::new();
            for record in &parsed {
                for standing in &record.results {
                    if !distinct.contains(&standing.name) {
                        distinct.push(standing.name.clone());
                    }
                }
            }
            distinct
        };
        let identities = resolver.resolve_batch(&names).await?;

        // Persist the whole batch in one transaction
        let batch: Vec<(game_records::GameRecord, Vec<game_records::RecordStanding>)> = parsed
            .into_iter()
            .map(|record| {
                let standings = record
                    .results
                    .iter()
                    .map(|s| game_records::RecordStanding {
                        player_id: identities[&s.name].guid,
                        rank: s.rank,
                        point_delta: s.point_delta,
                    })
                    .collect();

                (
                    game_records::GameRecord {
                        guid: Uuid::new_v4(),
                        content_hash: record.content_hash,
                        lobby: record.lobby,
                        time_cost_minutes: record.time_cost_minutes,
                        play_time: record.play_time,
                        rule_name: record.rule_name,
                        ref_code: record.ref_code,
                        raw_line: record.raw_line,
                    },
                    standings,
                )
            })
            .collect();

        let inserted = game_records::insert_batch(&self.db, &batch).await?;
        // Records that gained a row between the dedup check and the commit
        summary.duplicates += batch.len() - inserted;
        summary.new_records = inserted;

        tracing::info!(
            player = player_name,
            new_records = summary.new_records,
            duplicates = summary.duplicates,
            malformed = summary.malformed,
            "record feed ingested"
        );

        Ok(summary)
    }
}

impl IngestOutcome {
    fn ok(message: String) -> Self {
        Self { ok: true, message }
    }

    fn failed(message: String) -> Self {
        Self { ok: false, message }
    }

    /// Shape a single-log result for the calling layer
    pub fn from_log(raw_ref: &str, result: &IngestResult<LogOutcome>) -> Self {
        match result {
            Ok(LogOutcome::Ingested { .. }) => Self::ok(format!("game log {} ingested", raw_ref)),
            Ok(LogOutcome::AlreadyIngested) => {
                Self::failed("game log already uploaded".to_string())
            }
            Err(e) => Self::from_error(e),
        }
    }

    /// Shape a bulk-records result for the calling layer
    pub fn from_records(player_name: &str, result: &IngestResult<RecordsSummary>) -> Self {
        match result {
            Ok(summary) => Self::ok(format!(
                "stored {} new records for {} ({} duplicates, {} malformed lines skipped)",
                summary.new_records, player_name, summary.duplicates, summary.malformed
            )),
            Err(e) => Self::from_error(e),
        }
    }

    fn from_error(error: &IngestError) -> Self {
        let message = match error {
            IngestError::Throttled { retry_at, .. } => format!(
                "player was checked recently, retry after {}",
                retry_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            other => other.to_string(),
        };
        Self::failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_messages() {
        let ok = IngestOutcome::from_log(
            "ref",
            &Ok(LogOutcome::Ingested {
                log_id: Uuid::new_v4(),
            }),
        );
        assert!(ok.ok);
        assert!(ok.message.contains("ingested"));

        let dup = IngestOutcome::from_log("ref", &Ok(LogOutcome::AlreadyIngested));
        assert!(!dup.ok);
        assert!(dup.message.contains("already uploaded"));

        let throttled: IngestResult<RecordsSummary> = Err(IngestError::Throttled {
            last_checked: Utc::now(),
            retry_at: Utc::now(),
        });
        let outcome = IngestOutcome::from_records("Alice", &throttled);
        assert!(!outcome.ok);
        assert!(outcome.message.contains("retry after"));

        let stored = IngestOutcome::from_records(
            "Alice",
            &Ok(RecordsSummary {
                new_records: 2,
                duplicates: 1,
                malformed: 1,
            }),
        );
        assert!(stored.ok);
        assert!(stored.message.contains("2 new records"));
    }
}
