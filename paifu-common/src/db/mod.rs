//! Database access for paifu services
//!
//! Opens the shared SQLite database and keeps the schema current. Table
//! creation is idempotent; the unique indexes created here are the
//! authoritative dedup guard for player names, reference codes and record
//! content hashes, and every ingest path relies on them holding.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the database at `db_path` and initialize tables
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Open an in-memory database with the full schema; used by tests
///
/// Pinned to a single connection: every pooled connection to `:memory:`
/// would otherwise get its own empty database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create the ingest tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            owner_user_id TEXT,
            last_checked_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS game_logs (
            guid TEXT PRIMARY KEY,
            ref_code TEXT NOT NULL UNIQUE,
            upload_user_id TEXT,
            upload_time TEXT NOT NULL,
            play_time TEXT NOT NULL,
            lobby TEXT NOT NULL,
            rule_code TEXT NOT NULL,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS game_log_players (
            game_log_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            seat INTEGER NOT NULL,
            PRIMARY KEY (game_log_id, player_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS game_records (
            guid TEXT PRIMARY KEY,
            content_hash TEXT NOT NULL UNIQUE,
            lobby TEXT NOT NULL,
            time_cost_minutes INTEGER,
            play_time TEXT NOT NULL,
            rule_name TEXT NOT NULL,
            ref_code TEXT,
            raw_line TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS game_record_players (
            game_record_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            rank INTEGER NOT NULL,
            point_delta REAL NOT NULL,
            PRIMARY KEY (game_record_id, player_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_game_logs_play_time ON game_logs (play_time)",
        "CREATE INDEX IF NOT EXISTS idx_game_logs_upload_time ON game_logs (upload_time)",
        "CREATE INDEX IF NOT EXISTS idx_game_records_play_time ON game_records (play_time)",
        "CREATE INDEX IF NOT EXISTS idx_game_log_players_player ON game_log_players (player_id)",
        "CREATE INDEX IF NOT EXISTS idx_game_record_players_player ON game_record_players (player_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database tables initialized");

    Ok(())
}
