//! paifu-ingest command-line entry point
//!
//! Runs one ingestion against the configured database: a single game log by
//! reference, or a player's bulk record feed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use paifu_ingest::services::tenhou_client::TenhouClient;
use paifu_ingest::{IngestOutcome, IngestionService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "paifu-ingest", about = "Tenhou match-history ingestion", version)]
struct Cli {
    /// Config file path (defaults to PAIFU_CONFIG or the platform location)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest one game log by reference code (or a URL containing one)
    Log { reference: String },
    /// Ingest a player's bulk record feed
    Records { player: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = paifu_common::config::load(cli.config.as_deref())?;

    let level = config
        .logging
        .level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting paifu-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = paifu_common::config::database_path(&config);
    info!("Database: {}", db_path.display());
    let pool = paifu_common::db::connect(&db_path).await?;

    let client = Arc::new(TenhouClient::new(&config.provider)?);
    let service = IngestionService::new(pool, client, &config)?;

    let outcome = match cli.command {
        Command::Log { reference } => {
            IngestOutcome::from_log(&reference, &service.ingest_log(&reference, None).await)
        }
        Command::Records { player } => {
            IngestOutcome::from_records(&player, &service.ingest_records(&player).await)
        }
    };

    println!("{}", outcome.message);
    if !outcome.ok {
        std::process::exit(1);
    }

    Ok(())
}
