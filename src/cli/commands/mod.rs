//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod harvest;
mod query;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "policyscout")]
#[command(about = "Collect, cache and query fishery and agriculture policy records")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file and environment)
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run a collection cycle (serves the cache when fresh)
    Harvest {
        /// Crawl even if the cache is fresh
        #[arg(short, long)]
        full_refresh: bool,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query records, refreshing first when the cache is stale
    Query {
        /// Category: policy, funding, technology or other
        #[arg(long)]
        category: Option<String>,
        /// Province or region name
        #[arg(short, long)]
        region: Option<String>,
        /// Substring matched against title and summary
        #[arg(short, long)]
        keyword: Option<String>,
        /// Show a single record by id
        #[arg(long)]
        id: Option<String>,
        /// Maximum records to print (0 = unlimited)
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Read the cache only, never crawl
        #[arg(long)]
        offline: bool,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show cache and domain health status
    Status {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.data,
    };
    let (settings, _config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Harvest { full_refresh, json } => {
            harvest::cmd_harvest(settings, full_refresh, json).await
        }
        Commands::Query {
            category,
            region,
            keyword,
            id,
            limit,
            offline,
            json,
        } => {
            query::cmd_query(
                settings,
                query::QueryArgs {
                    category,
                    region,
                    keyword,
                    id,
                    limit,
                    offline,
                    json,
                },
            )
            .await
        }
        Commands::Status { json } => status::cmd_status(&settings, json).await,
    }
}
