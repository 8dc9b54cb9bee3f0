//! Asteroid Radar
//!
//! Command-line front end for the offline-first NASA asteroid cache.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use radar_core::config::{Config, load_config};
use radar_core::tracing_init::{default_filter, init_tracing};
use radar_sync::nasa::{NasaClient, NasaConfig};
use radar_sync::{AsteroidFilter, CacheStore, SyncRepository};

#[derive(Parser, Debug)]
#[command(name = "asteroid-radar")]
#[command(version, about = "Asteroid Radar - offline-first cache of NASA near-earth objects")]
struct Args {
    /// Settings file (defaults to the global settings.json)
    #[arg(long, env = "ASTEROID_RADAR_CONFIG")]
    config: Option<PathBuf>,

    /// Cache database file path
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// NASA API key (https://api.nasa.gov)
    #[arg(long)]
    api_key: Option<String>,

    /// API root, e.g. a local mirror
    #[arg(long)]
    base_url: Option<String>,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "ASTEROID_RADAR_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the asteroid feed and picture of the day, then evict stale rows
    Refresh,
    /// Print cached asteroids
    List {
        /// Which asteroids to show: all, today, week
        #[arg(short, long, default_value = "all")]
        filter: AsteroidFilter,
        /// Show a single asteroid by feed id
        #[arg(long, conflicts_with = "filter")]
        id: Option<i64>,
    },
    /// Print the cached picture of the day
    Picture,
    /// Evict asteroids before today and pictures ingested before today
    Clean,
    /// Sync periodically and print the list whenever it changes
    Watch {
        /// Seconds between syncs (defaults to sync.refresh_interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Which asteroids to show: all, today, week
        #[arg(short, long, default_value = "all")]
        filter: AsteroidFilter,
    },
}

impl Command {
    const fn name(&self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::List { .. } => "list",
            Self::Picture => "picture",
            Self::Clean => "clean",
            Self::Watch { .. } => "watch",
        }
    }
}

impl Args {
    /// Apply command-line values on top of file and environment config.
    fn apply_to(&self, config: &mut Config) {
        if let Some(path) = &self.db_path {
            config.cache.database_path = Some(path.clone());
        }
        if let Some(key) = &self.api_key {
            config.api.api_key.clone_from(key);
        }
        if let Some(url) = &self.base_url {
            config.api.base_url.clone_from(url);
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate()?;

    init_tracing(&default_filter(&config.logging.level), config.logging.json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = args.command.name(),
        base_url = %config.api.base_url,
        "Starting asteroid-radar"
    );

    let db_path = config
        .database_path()
        .context("could not determine a data directory; pass --db-path")?;
    let store = CacheStore::open(&db_path).await?;
    let client = NasaClient::new(&NasaConfig::from(&config.api))?;
    let repo = Arc::new(SyncRepository::new(store, client));

    match args.command {
        Command::Refresh => commands::refresh(&repo).await,
        Command::List { filter, id } => match id {
            Some(id) => commands::show(&repo, id).await,
            None => commands::list(&repo, filter).await,
        },
        Command::Picture => commands::picture(&repo).await,
        Command::Clean => commands::clean(&repo).await,
        Command::Watch {
            interval_secs,
            filter,
        } => {
            let secs = interval_secs.unwrap_or(config.sync.refresh_interval_secs);
            anyhow::ensure!(secs > 0, "--interval-secs must be greater than 0");
            commands::watch(repo, filter, std::time::Duration::from_secs(secs)).await
        }
    }
}
