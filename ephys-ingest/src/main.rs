//! Ingest (ephys-ingest) - Main entry point
//!
//! Single pass over the configured data roots: sessions, probe insertions,
//! recordings and clusterings not yet stored are registered, then the
//! process exits.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ephys_common::config::{
    load_toml_config, resolve_config_path, resolve_database_path, ENV_DATABASE,
};
use ephys_common::db::Subject;
use ephys_ingest::{CliOverrides, IngestConfig, IngestDriver, InsertOptions, SqliteStore, Store};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for ephys-ingest
#[derive(Parser, Debug)]
#[command(name = "ephys-ingest")]
#[command(about = "Register Neuropixels sessions, probe insertions and clusterings")]
#[command(version)]
struct Args {
    /// Root data directory holding one directory per subject (repeatable)
    #[arg(short, long = "root-data-dir")]
    root_data_dir: Vec<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clustering method recorded on new clusterings
    #[arg(long)]
    clustering_method: Option<String>,

    /// Register a subject before ingesting (repeatable)
    #[arg(long = "seed-subject")]
    seed_subject: Vec<String>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so `logging.level` can seed the filter
    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config =
        load_toml_config(config_path.as_deref()).context("Failed to load config file")?;

    let level = toml_config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ephys_ingest={level},ephys_common={level},warn").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ephys-ingest v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOverrides {
        root_data_dirs: args.root_data_dir,
        clustering_method: args.clustering_method,
    };
    let config = IngestConfig::resolve(&cli, &toml_config)
        .context("Failed to resolve root data directory")?;

    let db_path = resolve_database_path(args.database.as_deref(), ENV_DATABASE, &toml_config);
    info!("Database: {}", db_path.display());

    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    if !args.seed_subject.is_empty() {
        let subjects: Vec<Subject> = args.seed_subject.iter().map(Subject::new).collect();
        let seeded = store
            .insert(&subjects, InsertOptions::skip_duplicates())
            .await
            .context("Failed to register subjects")?;
        info!(requested = subjects.len(), seeded, "Subjects registered");
    }

    let driver = IngestDriver::new(store, config);
    let report = driver.run().await.context("Ingest failed")?;

    for line in report.display_string().lines() {
        info!("{}", line);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    }

    Ok(())
}
