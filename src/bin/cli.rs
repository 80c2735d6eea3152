//! Harvester CLI
//!
//! Local execution entry point. For AWS Lambda, use `harvester-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use harvester::{
    error::{AppError, Result},
    models::{Config, Source},
    pipeline::{DeletionGuard, GuardConfig, SyncEngine, run_collection},
    services::{self, ScrapeContext},
    storage::{ContentStore, LocalStore},
    utils::http,
};

/// Harvester - Zephyr content collector
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Collects Zephyr support content and syncs it into the knowledge store"
)]
struct Cli {
    /// Path to the storage directory containing config and data
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape all sources and reconcile them into the store
    Run {
        /// Restrict the run to specific sources (repeatable)
        #[arg(long = "source", value_name = "SOURCE")]
        sources: Vec<Source>,
    },

    /// Validate the configuration file
    Validate,

    /// Show per-source record counts from the store
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Harvester starting...");

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    config.validate()?;

    let config = Arc::new(config);
    let store = LocalStore::new(&cli.storage_dir);

    match cli.command {
        Command::Run { sources } => {
            let api_key = std::env::var(&config.api.api_key_env).ok();
            if api_key.is_none() {
                log::warn!(
                    "{} not set; API requests will run unauthenticated",
                    config.api.api_key_env
                );
            }

            let client = http::create_api_client(&config.http, &config.api, api_key.as_deref())?;
            let ctx = ScrapeContext::new(client, Arc::clone(&config));
            let engine = SyncEngine::with_guard(DeletionGuard::with_config(GuardConfig::from(
                &config.sync,
            )));

            let scrapers: Vec<_> = services::all_scrapers()
                .into_iter()
                .filter(|scraper| {
                    sources.is_empty()
                        || scraper.sources().iter().any(|s| sources.contains(s))
                })
                .collect();
            if scrapers.is_empty() {
                return Err(AppError::config("No scrapers match the requested sources"));
            }

            let report = run_collection(&ctx, &store, &engine, &scrapers).await?;

            for source_report in &report.sources {
                match (&source_report.summary, &source_report.error) {
                    (Some(summary), None) => log::info!(
                        "{}: {} collected, {} inserted, {} removed{}",
                        source_report.source,
                        source_report.collected,
                        summary.inserted,
                        summary.removed,
                        if summary.deletions_deferred {
                            " (deletions deferred)"
                        } else {
                            ""
                        }
                    ),
                    (_, Some(error)) => {
                        log::error!("{}: FAILED - {}", source_report.source, error)
                    }
                    _ => {}
                }
            }

            if report.has_failures() {
                let failed: Vec<String> = report
                    .failed_sources()
                    .iter()
                    .map(Source::to_string)
                    .collect();
                return Err(AppError::scrape(
                    "run",
                    format!("sources failed: {}", failed.join(", ")),
                ));
            }

            log::info!("Run complete!");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if !config_path.exists() {
                log::warn!(
                    "No config file at {}; defaults are in effect",
                    config_path.display()
                );
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            for source in Source::ALL {
                let records = store.load(source).await?;
                if records.is_empty() {
                    log::info!("{source}: empty");
                } else {
                    let latest = records.iter().map(|r| r.collected_at).max();
                    log::info!(
                        "{source}: {} records (latest collected {})",
                        records.len(),
                        latest.map(|t| t.to_rfc3339()).unwrap_or_default()
                    );
                }
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
