//! Library interface for the eswrap CLI
//!
//! Command logic lives here so it can be driven against a mock transport in
//! integration tests; `main.rs` only parses arguments and wires things up.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod search;

pub use anyhow::Result;
pub use eswrap_core::config::Config;

use anyhow::Context;
use eswrap_client::EsClient;
use std::io::Write;

/// Initialize logging system
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "{}={level},eswrap_client={level},eswrap_core={level}",
            env!("CARGO_PKG_NAME")
        ))
        .with_writer(std::io::stderr)
        .init();
}

/// Prints cluster name and version
pub async fn print_info<W: Write>(client: &EsClient, out: &mut W) -> Result<()> {
    let info = client
        .info()
        .await
        .context("Failed to fetch cluster info")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
    Ok(())
}

pub async fn print_count<W: Write>(client: &EsClient, index: &str, out: &mut W) -> Result<()> {
    let count = client
        .count_all(index)
        .await
        .with_context(|| format!("Failed to count documents in '{index}'"))?;
    writeln!(out, "{count}")?;
    Ok(())
}

/// Registers every script under `[scripts.stored]`
pub async fn register_scripts<W: Write>(
    client: &EsClient,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    if config.scripts.stored.is_empty() {
        writeln!(out, "No stored scripts configured")?;
        return Ok(());
    }
    let registered = client
        .register_scripts(&config.scripts.stored)
        .await
        .context("Failed to register stored scripts")?;
    writeln!(
        out,
        "Registered {registered}/{} stored scripts",
        config.scripts.stored.len()
    )?;
    Ok(())
}
