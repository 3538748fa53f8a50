//! Game record persistence
//!
//! One row per parsed bulk-feed line, keyed by content hash. A batch commits
//! as a single transaction; within it each record inserts with `ON CONFLICT
//! DO NOTHING` so that a concurrently stored duplicate skips its join rows
//! instead of failing the whole batch.

use chrono::NaiveDateTime;
use paifu_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// One stored bulk-feed record
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub guid: Uuid,
    pub content_hash: String,
    pub lobby: String,
    pub time_cost_minutes: Option<i64>,
    pub play_time: NaiveDateTime,
    pub rule_name: String,
    pub ref_code: Option<String>,
    pub raw_line: String,
}

/// One participant's standing within a stored record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStanding {
    pub player_id: Uuid,
    pub rank: i64,
    pub point_delta: f64,
}

/// True when a record with this content hash is already stored
pub async fn hash_exists(pool: &SqlitePool, content_hash: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT guid FROM game_records WHERE content_hash = ? LIMIT 1")
            .bind(content_hash)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

/// Insert a batch of records and their join rows in one transaction
///
/// Returns the number of records actually inserted; records whose hash
/// gained a row since the caller's dedup check are skipped along with their
/// join rows.
pub async fn insert_batch(
    pool: &SqlitePool,
    batch: &[(GameRecord, Vec<RecordStanding>)],
) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for (record, standings) in batch {
        let result = sqlx::query(
            r#"
            INSERT INTO game_records (guid, content_hash, lobby, time_cost_minutes, play_time, rule_name, ref_code, raw_line)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(content_hash) DO NOTHING
            "#,
        )
        .bind(record.guid.to_string())
        .bind(&record.content_hash)
        .bind(&record.lobby)
        .bind(record.time_cost_minutes)
        .bind(record.play_time)
        .bind(&record.rule_name)
        .bind(&record.ref_code)
        .bind(&record.raw_line)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(hash = %record.content_hash, "record already stored, skipping");
            continue;
        }
        inserted += 1;

        for standing in standings {
            sqlx::query(
                r#"
                INSERT INTO game_record_players (game_record_id, player_id, rank, point_delta)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(record.guid.to_string())
            .bind(standing.player_id.to_string())
            .bind(standing.rank)
            .bind(standing.point_delta)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    Ok(inserted)
}
