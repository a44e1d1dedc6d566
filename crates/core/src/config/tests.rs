//! Tests for configuration module

use super::*;
use crate::error::{Error, Result};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

/// Serializes tests that read the process environment through `from_file`
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn create_temp_config_file(content: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .map_err(|e| Error::config(format!("Failed to create temp file: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::config(format!("Failed to write temp file: {e}")))?;
    file.flush()
        .map_err(|e| Error::config(format!("Failed to flush temp file: {e}")))?;
    Ok(file)
}

fn with_env_var<F, T>(key: &str, value: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let _guard = env_lock();
    std::env::set_var(key, value);
    let result = f();
    std::env::remove_var(key);
    result
}

#[test]
fn test_from_toml_str_valid() {
    let toml = r#"
        [client]
        addresses = ["http://es01:9200", "http://es02:9200"]
        timeout_secs = 5
        v7_compatible = true

        [client.default_headers]
        x-opaque-id = "eswrap-tests"

        [scripts.stored]
        bump = "ctx._source.counter += 1"
    "#;

    let config = Config::from_toml_str(toml).expect("Failed to parse valid TOML");
    assert_eq!(config.client.addresses.len(), 2);
    assert_eq!(config.client.timeout_secs, 5);
    assert!(config.client.v7_compatible);
    assert_eq!(
        config.client.default_headers.get("x-opaque-id").map(String::as_str),
        Some("eswrap-tests")
    );
    assert_eq!(config.scripts.stored.len(), 1);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_str_minimal() {
    let config = Config::from_toml_str("").expect("Failed to parse minimal TOML");
    // Check defaults are applied
    assert_eq!(config.client.addresses, vec!["http://localhost:9200".to_string()]);
    assert_eq!(config.client.connect_timeout_secs, 10);
    assert_eq!(config.client.pool_idle_timeout_secs, 90);
    assert_eq!(config.client.pool_max_idle_per_host, 100);
    assert!(!config.client.v7_compatible);
    assert!(!config.scripts.register_on_startup);
}

#[test]
fn test_from_toml_str_invalid_syntax() {
    let toml = r#"
        [client
        timeout_secs = 5
    "#;

    let result = Config::from_toml_str(toml);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse TOML"));
}

#[test]
fn test_validate_rejects_empty_addresses() {
    let mut config = Config::default();
    config.client.addresses.clear();

    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("no search server address provided"));
}

#[test]
fn test_validate_rejects_address_without_scheme() {
    let mut config = Config::default();
    config.client.addresses = vec!["localhost:9200".to_string()];
    assert!(config.validate().is_err());

    config.client.addresses = vec!["https://".to_string()];
    assert!(config.validate().is_err());

    config.client.addresses = vec!["https://search.internal:9243".to_string()];
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_timeouts() {
    let mut config = Config::default();
    config.client.timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.client.connect_timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_blank_script_id() {
    let mut config = Config::default();
    config
        .scripts
        .stored
        .insert(" ".to_string(), "ctx._source.a = 1".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_debug_redacts_header_values() {
    let mut config = ClientConfig::default();
    config
        .default_headers
        .insert("authorization".to_string(), "ApiKey c2VjcmV0".to_string());

    let debug = format!("{config:?}");
    assert!(debug.contains("authorization"));
    assert!(debug.contains("***REDACTED***"));
    assert!(!debug.contains("c2VjcmV0"));
}

#[test]
fn test_from_file_reads_toml() {
    let file = create_temp_config_file(
        r#"
        [client]
        addresses = ["http://from-file:9200"]
        timeout_secs = 12
    "#,
    )
    .expect("Failed to create temp config");

    let config = {
        let _guard = env_lock();
        Config::from_file(file.path()).expect("Failed to load config")
    };
    assert_eq!(config.client.addresses, vec!["http://from-file:9200".to_string()]);
    assert_eq!(config.client.timeout_secs, 12);
    // Untouched keys keep their defaults
    assert_eq!(config.client.connect_timeout_secs, 10);
}

#[test]
fn test_from_file_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = {
        let _guard = env_lock();
        Config::from_file(&dir.path().join("absent.toml")).expect("Failed to load")
    };
    assert_eq!(config.client.timeout_secs, 30);
    assert!(config.scripts.stored.is_empty());
}

#[test]
fn test_env_override_timeout() {
    let file = create_temp_config_file(
        r#"
        [client]
        timeout_secs = 12
    "#,
    )
    .expect("Failed to create temp config");

    let config = with_env_var("ESWRAP_CLIENT__POOL_MAX_IDLE_PER_HOST", "7", || {
        Config::from_file(file.path())
    })
    .expect("Failed to load config");

    assert_eq!(config.client.pool_max_idle_per_host, 7);
    assert_eq!(config.client.timeout_secs, 12);
}

#[test]
fn test_env_addresses_parse_as_list() {
    let file = create_temp_config_file(
        r#"
        [client]
        addresses = ["http://from-file:9200"]
    "#,
    )
    .expect("Failed to create temp config");

    let config = with_env_var(
        "ESWRAP_CLIENT__ADDRESSES",
        "http://es01:9200,http://es02:9200",
        || Config::from_file(file.path()),
    )
    .expect("Failed to load config");

    assert_eq!(
        config.client.addresses,
        vec!["http://es01:9200".to_string(), "http://es02:9200".to_string()]
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_elasticsearch_url_replaces_addresses() {
    let file = create_temp_config_file(
        r#"
        [client]
        addresses = ["http://es01:9200", "http://es02:9200"]
        timeout_secs = 12
    "#,
    )
    .expect("Failed to create temp config");

    let config = with_env_var("ELASTICSEARCH_URL", "https://search.internal:9243", || {
        Config::from_file(file.path())
    })
    .expect("Failed to load config");

    assert_eq!(
        config.client.addresses,
        vec!["https://search.internal:9243".to_string()]
    );
    assert_eq!(config.client.timeout_secs, 12);
}

#[test]
fn test_blank_elasticsearch_url_is_ignored() {
    let file = create_temp_config_file(
        r#"
        [client]
        addresses = ["http://from-file:9200"]
    "#,
    )
    .expect("Failed to create temp config");

    let config = with_env_var("ELASTICSEARCH_URL", "  ", || Config::from_file(file.path()))
        .expect("Failed to load config");

    assert_eq!(config.client.addresses, vec!["http://from-file:9200".to_string()]);
}
