mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog_sync::{CatalogVersion, FailurePolicy, SyncMode, SyncOptions};
use clap::{Parser, Subcommand};

use crate::commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(about = "Import catalog content and drive catalog synchronization jobs")]
struct Cli {
    /// Path to the config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the configured import pipeline
    Run,
    /// Synchronize one source catalog version into a target
    Sync {
        /// Human-readable name of the synchronization
        #[arg(long)]
        name: String,
        /// Source as CATALOG:VERSION
        #[arg(long, value_parser = parse_catalog_version)]
        source: CatalogVersion,
        /// Target as CATALOG:VERSION
        #[arg(long, value_parser = parse_catalog_version)]
        target: CatalogVersion,
        /// Overwrite target items even when unchanged
        #[arg(long)]
        force_update: bool,
        /// Only synchronize items changed since the last run
        #[arg(long)]
        incremental: bool,
        /// Keep execution log lines in the local history
        #[arg(long)]
        persist_to_store: bool,
        /// Ask the platform to write the job log to a file
        #[arg(long)]
        persist_to_file: bool,
        /// Treat an unclean outcome as an error
        #[arg(long)]
        strict: bool,
        /// Abort the job after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// List recorded executions, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show freshness and the latest execution for a job
    Status {
        /// Sync job code
        job_code: String,
    },
}

fn parse_catalog_version(s: &str) -> Result<CatalogVersion, String> {
    CatalogVersion::parse(s).ok_or_else(|| format!("expected CATALOG:VERSION, got '{s}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let app = config::load_config(cli.config.as_deref()).context("failed to load config")?;
    tracing::debug!(base_url = %app.platform.base_url, "config loaded");

    match cli.command {
        Command::Run => commands::run::run(&app).await,
        Command::Sync {
            name,
            source,
            target,
            force_update,
            incremental,
            persist_to_store,
            persist_to_file,
            strict,
            deadline_secs,
        } => {
            let options = SyncOptions {
                persist_to_store,
                persist_to_file,
                force_update,
                mode: if incremental {
                    SyncMode::Incremental
                } else {
                    SyncMode::Full
                },
            };
            let policy = if strict {
                FailurePolicy::Strict
            } else {
                FailurePolicy::Lenient
            };
            commands::sync::run(
                &app,
                SyncArgs {
                    name,
                    source,
                    target,
                    options,
                    policy,
                    deadline_secs,
                },
            )
            .await
        }
        Command::History { limit } => commands::history::run(&app, limit),
        Command::Status { job_code } => commands::status::run(&app, &job_code),
    }
}
