//! # offsync
//!
//! CLI tool for inspecting and editing an offsync local cache.
//!
//! Every command runs offline against `<data-dir>/cache.db`, so edits are
//! queued exactly as an application would queue them without a network.
//!
//! ## Commands
//!
//! - `list`: List cached records
//! - `get`: Show one record
//! - `put`: Write a record (queued for reconciliation)
//! - `delete`: Tombstone a record
//! - `pending`: Show queued changes and how they will be replayed
//! - `clear`: Wipe the cache
//! - `status`: Show cache status
//!
//! ## Example
//!
//! ```bash
//! # Create a record offline (a temporary key is assigned)
//! offsync --primary-key id put '{"title": "draft"}'
//!
//! # Edit a known record
//! offsync --primary-key id put --key 42 '{"id": "42", "done": true}'
//!
//! # See what the next reconciliation will send
//! offsync --primary-key id pending
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{clear, delete, get, list, pending, put, status};
use config::Settings;

/// CLI tool for inspecting and editing an offsync local cache.
#[derive(Parser, Debug)]
#[command(name = "offsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding cache.db and offsync.toml
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (default: <data-dir>/offsync.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Primary key field; repeat for a compound key
    #[arg(long = "primary-key", global = true)]
    primary_key: Vec<String>,

    /// Namespace prefix for cache keys
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List cached records
    List {
        /// Only records whose field equals the value (field=value)
        #[arg(long = "where", value_name = "FIELD=VALUE")]
        conditions: Vec<String>,
    },

    /// Show one record
    Get {
        /// Key; give several values for a compound key
        #[arg(required = true)]
        key: Vec<String>,
    },

    /// Write a record; without --key a temporary key is assigned
    Put {
        /// Key; repeat for a compound key
        #[arg(long)]
        key: Vec<String>,

        /// Record as a JSON object
        json: String,
    },

    /// Mark a record deleted
    Delete {
        /// Key; give several values for a compound key
        #[arg(required = true)]
        key: Vec<String>,
    },

    /// Show queued changes and the remote call each will become
    Pending,

    /// Remove every cached record and queued change
    Clear,

    /// Show cache status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let settings = Settings::load(
        &data_dir,
        cli.config.as_deref(),
        &cli.primary_key,
        cli.prefix.as_deref(),
    )?;

    match cli.command {
        Commands::List { conditions } => list::run(&settings, &conditions).await?,
        Commands::Get { key } => get::run(&settings, &key).await?,
        Commands::Put { key, json } => put::run(&settings, &key, &json).await?,
        Commands::Delete { key } => delete::run(&settings, &key).await?,
        Commands::Pending => pending::run(&settings).await?,
        Commands::Clear => clear::run(&settings).await?,
        Commands::Status => status::run(&settings).await?,
    }

    Ok(())
}

/// Get the default data directory for offsync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "offsync", "offsync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
