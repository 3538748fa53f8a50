//! Player persistence
//!
//! A player is a persistent identity keyed by display name; the unique index
//! on `name` is the authoritative guard against duplicate identities, so all
//! inserts go through `ON CONFLICT(name) DO NOTHING` and callers re-read the
//! stored row afterwards.

use chrono::{DateTime, Utc};
use paifu_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Persistent player identity
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub guid: Uuid,
    pub name: String,
    pub owner_user_id: Option<Uuid>,
    /// Last bulk record check; backs the fetch throttle
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: name.into(),
            owner_user_id: None,
            last_checked_at: None,
        }
    }
}

fn from_row(row: &SqliteRow) -> Result<Player> {
    let guid: String = row.try_get("guid")?;
    let owner: Option<String> = row.try_get("owner_user_id")?;

    Ok(Player {
        guid: parse_uuid(&guid)?,
        name: row.try_get("name")?,
        owner_user_id: owner.as_deref().map(parse_uuid).transpose()?,
        last_checked_at: row.try_get("last_checked_at")?,
    })
}

fn parse_uuid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| Error::Internal(format!("invalid UUID in database: {}", e)))
}

/// Load a player by display name
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Player>> {
    let row = sqlx::query(
        "SELECT guid, name, owner_user_id, last_checked_at FROM players WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Load every player whose name appears in `names`, in one query
pub async fn find_by_names(pool: &SqlitePool, names: &[String]) -> Result<Vec<Player>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT guid, name, owner_user_id, last_checked_at FROM players WHERE name IN (");
    let mut separated = qb.separated(", ");
    for name in names {
        separated.push_bind(name.as_str());
    }
    qb.push(")");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Insert a player, silently keeping any existing row with the same name
pub async fn insert_ignore(pool: &SqlitePool, player: &Player) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO players (guid, name, owner_user_id, last_checked_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(player.guid.to_string())
    .bind(&player.name)
    .bind(player.owner_user_id.map(|u| u.to_string()))
    .bind(player.last_checked_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a batch of players as one statement in one transaction
///
/// Names that gained a row concurrently are skipped; callers re-select to
/// obtain the authoritative identities.
pub async fn insert_many_ignore(pool: &SqlitePool, players: &[Player]) -> Result<()> {
    if players.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO players (guid, name, owner_user_id, last_checked_at) ");
    qb.push_values(players, |mut b, player| {
        b.push_bind(player.guid.to_string())
            .push_bind(player.name.clone())
            .push_bind(player.owner_user_id.map(|u| u.to_string()))
            .push_bind(player.last_checked_at);
    });
    qb.push(" ON CONFLICT(name) DO NOTHING");

    qb.build().execute(&mut *tx).await?;
    tx.commit().await?;

    tracing::debug!(count = players.len(), "player batch inserted");

    Ok(())
}

/// Refresh the throttle timestamp
pub async fn touch_last_checked(
    pool: &SqlitePool,
    player_id: Uuid,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "UPDATE players SET last_checked_at = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(at)
    .bind(player_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Number of stored game records referencing this player
pub async fn record_count(pool: &SqlitePool, player_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM game_record_players WHERE player_id = ?")
            .bind(player_id.to_string())
            .fetch_one(pool)
            .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = paifu_common::db::connect_memory().await.unwrap();

        let player = Player::new("Alice");
        insert_ignore(&pool, &player).await.unwrap();

        let loaded = find_by_name(&pool, "Alice").await.unwrap().unwrap();
        assert_eq!(loaded, player);
        assert!(find_by_name(&pool, "Bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_ignore_keeps_first_row() {
        let pool = paifu_common::db::connect_memory().await.unwrap();

        let first = Player::new("Alice");
        insert_ignore(&pool, &first).await.unwrap();
        insert_ignore(&pool, &Player::new("Alice")).await.unwrap();

        let loaded = find_by_name(&pool, "Alice").await.unwrap().unwrap();
        assert_eq!(loaded.guid, first.guid);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_find_by_names_batch() {
        let pool = paifu_common::db::connect_memory().await.unwrap();

        insert_ignore(&pool, &Player::new("Alice")).await.unwrap();
        insert_ignore(&pool, &Player::new("Bob")).await.unwrap();

        let found = find_by_names(
            &pool,
            &["Alice".to_string(), "Bob".to_string(), "Carol".to_string()],
        )
        .await
        .unwrap();

        let mut names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_touch_last_checked_roundtrip() {
        let pool = paifu_common::db::connect_memory().await.unwrap();

        let player = Player::new("Alice");
        insert_ignore(&pool, &player).await.unwrap();
        assert!(find_by_name(&pool, "Alice").await.unwrap().unwrap().last_checked_at.is_none());

        let now = Utc::now();
        touch_last_checked(&pool, player.guid, now).await.unwrap();

        let loaded = find_by_name(&pool, "Alice").await.unwrap().unwrap();
        assert_eq!(loaded.last_checked_at, Some(now));
    }
}
