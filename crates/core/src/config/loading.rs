//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `ESWRAP_` and use double underscores
    /// for nested values. For example:
    /// - `ESWRAP_CLIENT__TIMEOUT_SECS=5`
    /// - `ESWRAP_CLIENT__ADDRESSES=http://es1:9200,http://es2:9200`
    ///
    /// `ELASTICSEARCH_URL`, when set, replaces the address list with a single node.
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // Set client defaults explicitly (config crate doesn't apply serde defaults for missing sections)
        let builder = set_config_default(builder, "client.addresses", default_addresses())?;
        let builder = set_config_default(
            builder,
            "client.timeout_secs",
            default_timeout_secs() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "client.connect_timeout_secs",
            default_connect_timeout_secs() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "client.pool_idle_timeout_secs",
            default_pool_idle_timeout_secs() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "client.pool_max_idle_per_host",
            default_pool_max_idle_per_host() as i64,
        )?;
        let builder =
            set_config_default(builder, "client.v7_compatible", default_v7_compatible())?;
        let mut builder = set_config_default(
            builder,
            "scripts.register_on_startup",
            default_register_on_startup(),
        )?;

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Add environment variables with ESWRAP_ prefix
        builder = builder.add_source(
            Environment::with_prefix("ESWRAP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("client.addresses")
                .try_parsing(true),
        );

        // Conventional single-node override used by most Elasticsearch tooling
        if let Ok(url) = std::env::var("ELASTICSEARCH_URL") {
            if !url.trim().is_empty() {
                builder = builder
                    .set_override("client.addresses", vec![url])
                    .map_err(|e| Error::config(format!("Failed to set ELASTICSEARCH_URL: {e}")))?;
            }
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.eswrap/config.toml or custom --config path)
    /// 3. Environment variables (ESWRAP_*, ELASTICSEARCH_URL)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        let config = Self::from_file(&path)?;
        config.validate()?;
        Ok(config)
    }
}
