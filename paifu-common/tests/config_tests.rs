//! Tests for configuration loading and resolution
//!
//! Note: Uses serial_test to prevent ENV variable race conditions. Tests
//! that manipulate PAIFU_CONFIG or PAIFU_DATABASE are marked #[serial] so
//! they run sequentially, not in parallel.

use paifu_common::config::{self, TomlConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_defaults_are_complete() {
    let config = TomlConfig::default();

    assert!(config.provider.log_url.starts_with("https://"));
    assert!(config.provider.records_url.starts_with("https://"));
    assert!(config.provider.ref_pattern.contains("gm"));
    assert!(config.provider.records_pattern.contains("records"));
    assert_eq!(config.provider.ref_placeholder, "---");
    assert_eq!(config.ingest.check_cooldown_hours, 24);
    assert_eq!(config.logging.level, "info");
    assert!(config.database_path.is_none());
}

#[test]
fn test_partial_toml_falls_back_to_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        database_path = "/tmp/paifu-test.db"

        [ingest]
        check_cooldown_hours = 6
        "#
    )
    .unwrap();
    file.flush().unwrap();

    let config = config::load(Some(file.path())).unwrap();

    assert_eq!(config.database_path, Some(PathBuf::from("/tmp/paifu-test.db")));
    assert_eq!(config.ingest.check_cooldown_hours, 6);
    // Untouched sections keep their defaults
    assert_eq!(config.provider.ref_placeholder, "---");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let result = config::load(Some(std::path::Path::new("/nonexistent/paifu.toml")));
    assert!(result.is_err());
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "this is not toml [[[").unwrap();
    file.flush().unwrap();

    let result = config::load(Some(file.path()));
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_env_config_path_is_used() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [ingest]
        check_cooldown_hours = 48
        "#
    )
    .unwrap();
    file.flush().unwrap();

    env::set_var("PAIFU_CONFIG", file.path());
    let config = config::load(None).unwrap();
    env::remove_var("PAIFU_CONFIG");

    assert_eq!(config.ingest.check_cooldown_hours, 48);
}

#[test]
#[serial]
fn test_database_path_priority() {
    env::remove_var("PAIFU_DATABASE");

    // Config file value wins over the compiled default
    let mut config = TomlConfig::default();
    config.database_path = Some(PathBuf::from("/tmp/from-config.db"));
    assert_eq!(config::database_path(&config), PathBuf::from("/tmp/from-config.db"));

    // ENV wins over the config file
    env::set_var("PAIFU_DATABASE", "/tmp/from-env.db");
    assert_eq!(config::database_path(&config), PathBuf::from("/tmp/from-env.db"));
    env::remove_var("PAIFU_DATABASE");

    // With neither, a non-empty default is produced
    let fallback = config::database_path(&TomlConfig::default());
    assert!(!fallback.as_os_str().is_empty());
}
