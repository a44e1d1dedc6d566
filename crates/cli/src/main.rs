//! eswrap CLI - inspect and query a search cluster
//!
//! This binary provides the command-line interface for the eswrap client.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eswrap::search::{read_body, run_search, SearchArgs};
use eswrap::{init_logging, print_count, print_info, register_scripts};
use eswrap_client::EsClient;
use eswrap_core::config::Config;
use eswrap_core::SortSchema;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "eswrap")]
#[command(about = "Typed client for Elasticsearch-compatible clusters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cluster name and version
    Info,
    /// Check that the cluster is reachable
    Ping,
    /// Count documents in an index
    Count {
        /// Index name or pattern
        index: String,
    },
    /// Search an index and print hits as JSON lines
    Search {
        /// Index name or pattern
        index: String,

        /// JSON file with the search body (defaults to match_all)
        #[arg(long, value_name = "FILE")]
        body: Option<PathBuf>,

        /// Hits per page
        #[arg(long, default_value_t = 10)]
        size: u64,

        /// Per-position sort kinds, e.g. "isf" (i = integer, f = float, s = string)
        #[arg(long, value_name = "KINDS")]
        sort_schema: Option<String>,

        /// Number of pages to fetch with search_after
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Manage stored scripts
    #[command(subcommand)]
    Scripts(ScriptCommands),
}

#[derive(Subcommand)]
enum ScriptCommands {
    /// Register every script listed under [scripts.stored]
    Register,
    /// Store the field-update script and print its id
    InitFieldUpdate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let client = EsClient::new(&config).context("Failed to create client")?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Info => print_info(&client, &mut stdout).await,
        Commands::Ping => {
            client.ping().await.context("Cluster did not answer ping")?;
            info!("Cluster is reachable");
            Ok(())
        }
        Commands::Count { index } => print_count(&client, &index, &mut stdout).await,
        Commands::Search {
            index,
            body,
            size,
            sort_schema,
            pages,
        } => {
            let args = SearchArgs {
                index,
                body: read_body(body.as_deref())?,
                size,
                sort_schema: sort_schema.as_deref().map(SortSchema::parse),
                pages,
            };
            run_search(&client, &args, &mut stdout).await.map(|_| ())
        }
        Commands::Scripts(ScriptCommands::Register) => {
            register_scripts(&client, &config, &mut stdout).await
        }
        Commands::Scripts(ScriptCommands::InitFieldUpdate) => {
            let id = client
                .init_field_update_script()
                .await
                .context("Failed to store field update script")?;
            writeln!(stdout, "{id}")?;
            Ok(())
        }
    }
}

/// Load configuration from the given file or the global default
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    info!("Using cluster nodes: {}", config.client.addresses.join(", "));
    Ok(config)
}
