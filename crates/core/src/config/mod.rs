//! Configuration module for eswrap
//!
//! This module provides configuration structures and loading mechanisms for the
//! search client. Configuration can be loaded from TOML files and/or environment
//! variables.

mod defaults;
mod loading;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.eswrap/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".eswrap").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings for the search cluster
    #[serde(default)]
    pub client: ClientConfig,

    /// Stored scripts managed by the client
    #[serde(default)]
    pub scripts: ScriptsConfig,
}

/// Connection settings for the search cluster
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URLs of the cluster nodes, used round-robin
    #[serde(default = "default_addresses")]
    pub addresses: Vec<String>,

    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// How long an idle pooled connection is kept
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Force `Content-Type: application/json` for 7.x clusters that reject
    /// the versioned vendor media type
    #[serde(default = "default_v7_compatible")]
    pub v7_compatible: bool,

    /// PEM file with an extra root certificate
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,

    /// Headers sent with every request
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted_headers: BTreeMap<&str, &str> = self
            .default_headers
            .keys()
            .map(|name| (name.as_str(), "***REDACTED***"))
            .collect();
        f.debug_struct("ClientConfig")
            .field("addresses", &self.addresses)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("pool_idle_timeout_secs", &self.pool_idle_timeout_secs)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("v7_compatible", &self.v7_compatible)
            .field("ca_cert_path", &self.ca_cert_path)
            .field("default_headers", &redacted_headers)
            .finish()
    }
}

/// Stored scripts to register with the cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Register every script in `stored` when the client is created
    #[serde(default = "default_register_on_startup")]
    pub register_on_startup: bool,

    /// Script id -> painless source
    #[serde(default)]
    pub stored: BTreeMap<String, String>,
}

// Default implementations

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addresses: default_addresses(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            v7_compatible: default_v7_compatible(),
            ca_cert_path: None,
            default_headers: BTreeMap::new(),
        }
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            register_on_startup: default_register_on_startup(),
            stored: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.client.addresses.is_empty() {
            return Err(Error::config(
                "no search server address provided (client.addresses is empty)".to_string(),
            ));
        }

        for address in &self.client.addresses {
            let trimmed = address.trim();
            let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
            let host = trimmed.split_once("://").map(|(_, rest)| rest).unwrap_or("");
            if !has_scheme || host.is_empty() {
                return Err(Error::config(format!(
                    "Invalid address '{address}'. Must be an http:// or https:// URL"
                )));
            }
        }

        if self.client.timeout_secs == 0 {
            return Err(Error::config(
                "client.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.client.connect_timeout_secs == 0 {
            return Err(Error::config(
                "client.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(name) = self
            .client
            .default_headers
            .keys()
            .find(|name| name.trim().is_empty())
        {
            return Err(Error::config(format!(
                "Invalid header name '{name}' in client.default_headers"
            )));
        }

        if let Some(id) = self.scripts.stored.keys().find(|id| id.trim().is_empty()) {
            return Err(Error::config(format!(
                "Invalid stored script id '{id}'"
            )));
        }

        Ok(())
    }
}
