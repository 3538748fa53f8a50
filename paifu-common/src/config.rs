//! Configuration loading and resolution
//!
//! Resolution priority follows the same order everywhere: explicit path
//! argument, then environment variable, then TOML config file, then the
//! compiled default. Missing files fall back to defaults; unreadable or
//! invalid files are a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Database file location (overridable via `PAIFU_DATABASE`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream provider endpoints and text-format patterns
///
/// The patterns are part of the provider contract, not of this codebase:
/// reference codes, the bulk feed wrapper and the point-delta notation are
/// all defined by the provider and occasionally change shape, so they are
/// configurable rather than hard-coded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Single game log endpoint; the normalized reference is the query string
    #[serde(default = "default_log_url")]
    pub log_url: String,
    /// Bulk per-player records endpoint (`?name=<player>`)
    #[serde(default = "default_records_url")]
    pub records_url: String,
    /// Reference code pattern; the first capture group is the normalized code
    #[serde(default = "default_ref_pattern")]
    pub ref_pattern: String,
    /// Pattern locating the record feed inside the records response; must
    /// expose a named capture group `records`
    #[serde(default = "default_records_pattern")]
    pub records_pattern: String,
    /// Point-delta token pattern inside a record's result text
    #[serde(default = "default_delta_pattern")]
    pub delta_pattern: String,
    /// Sentinel the provider emits in place of an absent reference
    #[serde(default = "default_ref_placeholder")]
    pub ref_placeholder: String,
    /// Timestamp format of the record line's play time field
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

/// Ingestion behavior knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Minimum interval between bulk record checks for one player
    #[serde(default = "default_cooldown_hours")]
    pub check_cooldown_hours: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_url() -> String {
    "https://tenhou.net/0/log/".to_string()
}

fn default_records_url() -> String {
    "https://tenhou.net/0/log/find.cgi".to_string()
}

fn default_ref_pattern() -> String {
    r"(\d{10}gm-[0-9a-f]{4}-\d{4}-[0-9a-f]{8})".to_string()
}

fn default_records_pattern() -> String {
    r"(?s)(?P<records>L\d+\|.*)".to_string()
}

fn default_delta_pattern() -> String {
    r"([+-]\d+(?:\.\d+)?)".to_string()
}

fn default_ref_placeholder() -> String {
    "---".to_string()
}

fn default_time_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

fn default_cooldown_hours() -> i64 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            log_url: default_log_url(),
            records_url: default_records_url(),
            ref_pattern: default_ref_pattern(),
            records_pattern: default_records_pattern(),
            delta_pattern: default_delta_pattern(),
            ref_placeholder: default_ref_placeholder(),
            time_format: default_time_format(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            check_cooldown_hours: default_cooldown_hours(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Load configuration
///
/// Priority order:
/// 1. Explicit path argument (missing file is an error)
/// 2. `PAIFU_CONFIG` environment variable (missing file is an error)
/// 3. Platform config file (`~/.config/paifu/config.toml` on Linux)
/// 4. Compiled defaults
pub fn load(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return read_config_file(path);
    }

    if let Ok(path) = std::env::var("PAIFU_CONFIG") {
        return read_config_file(Path::new(&path));
    }

    if let Some(path) = default_config_path() {
        if path.exists() {
            return read_config_file(&path);
        }
    }

    Ok(TomlConfig::default())
}

fn read_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paifu").join("config.toml"))
}

/// Resolve the database file location
///
/// Priority: `PAIFU_DATABASE` environment variable, then the config file,
/// then the platform data directory.
pub fn database_path(config: &TomlConfig) -> PathBuf {
    if let Ok(path) = std::env::var("PAIFU_DATABASE") {
        return PathBuf::from(path);
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    dirs::data_local_dir()
        .map(|d| d.join("paifu").join("paifu.db"))
        .unwrap_or_else(|| PathBuf::from("./paifu.db"))
}
