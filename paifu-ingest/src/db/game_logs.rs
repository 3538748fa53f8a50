//! Game log persistence
//!
//! One row per ingested game log, keyed by the provider reference code.
//! Logs are immutable after insert; the unique index on `ref_code` rejects
//! the second committer when two ingestions race on the same reference.

use chrono::{DateTime, NaiveDateTime, Utc};
use paifu_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// One ingested game log
#[derive(Debug, Clone, PartialEq)]
pub struct GameLog {
    pub guid: Uuid,
    pub ref_code: String,
    pub upload_user_id: Option<Uuid>,
    pub upload_time: DateTime<Utc>,
    /// Derived from the reference code, provider-local wall clock
    pub play_time: NaiveDateTime,
    pub lobby: String,
    pub rule_code: String,
    /// Raw provider JSON, kept opaque
    pub payload: String,
}

/// Load a log by its normalized reference code
pub async fn find_by_ref(pool: &SqlitePool, ref_code: &str) -> Result<Option<GameLog>> {
    let row = sqlx::query(
        r#"
        SELECT guid, ref_code, upload_user_id, upload_time, play_time, lobby, rule_code, payload
        FROM game_logs
        WHERE ref_code = ?
        "#,
    )
    .bind(ref_code)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid: String = row.try_get("guid")?;
            let owner: Option<String> = row.try_get("upload_user_id")?;

            Ok(Some(GameLog {
                guid: Uuid::parse_str(&guid)
                    .map_err(|e| Error::Internal(format!("invalid UUID in database: {}", e)))?,
                ref_code: row.try_get("ref_code")?,
                upload_user_id: owner
                    .as_deref()
                    .map(|o| {
                        Uuid::parse_str(o).map_err(|e| {
                            Error::Internal(format!("invalid UUID in database: {}", e))
                        })
                    })
                    .transpose()?,
                upload_time: row.try_get("upload_time")?,
                play_time: row.try_get("play_time")?,
                lobby: row.try_get("lobby")?,
                rule_code: row.try_get("rule_code")?,
                payload: row.try_get("payload")?,
            }))
        }
        None => Ok(None),
    }
}

/// Insert a log and its participant join rows as one transaction
///
/// `participants` pairs each player's guid with their seat index in the
/// payload's name order. A uniqueness violation on `ref_code` aborts the
/// whole transaction and surfaces to the caller untouched.
pub async fn insert_with_players(
    pool: &SqlitePool,
    log: &GameLog,
    participants: &[(Uuid, i64)],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO game_logs (guid, ref_code, upload_user_id, upload_time, play_time, lobby, rule_code, payload)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(log.guid.to_string())
    .bind(&log.ref_code)
    .bind(log.upload_user_id.map(|u| u.to_string()))
    .bind(log.upload_time)
    .bind(log.play_time)
    .bind(&log.lobby)
    .bind(&log.rule_code)
    .bind(&log.payload)
    .execute(&mut *tx)
    .await?;

    for (player_id, seat) in participants {
        sqlx::query(
            "INSERT INTO game_log_players (game_log_id, player_id, seat) VALUES (?, ?, ?)",
        )
        .bind(log.guid.to_string())
        .bind(player_id.to_string())
        .bind(seat)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(ref_code = %log.ref_code, participants = participants.len(), "game log stored");

    Ok(())
}
