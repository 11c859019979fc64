//! stormwatch CLI
//!
//! Local execution entry point: runs the refresh scheduler, single manual
//! cycles, and on-demand forecast generation against a local data directory.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use stormwatch::{
    error::{AppError, Result},
    models::{Config, FeedKind},
    pipeline::Scheduler,
    storage::{LocalStore, SnapshotStore},
    tracker::Tracker,
};

/// stormwatch - Storm Feed Ingestion and Forecast Service
#[derive(Parser, Debug)]
#[command(
    name = "stormwatch",
    version,
    about = "Storm feed ingestion and forecast service"
)]
struct Cli {
    /// Path to the data directory holding config and store files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the refresh scheduler until interrupted
    Run,

    /// Run one refresh cycle and exit
    Refresh,

    /// Show the system status view
    Status,

    /// Generate a forecast for one storm
    Forecast {
        /// Storm id (slug), e.g. "hurricane-erin"
        #[arg(long)]
        storm: String,
    },

    /// Analyze a storm's intensification trend
    Trend {
        /// Storm id (slug), e.g. "hurricane-erin"
        #[arg(long)]
        storm: String,
    },

    /// Show the latest snapshot for a feed kind (fetching if absent)
    Snapshot {
        /// Feed kind, e.g. "cones" or "pressure"
        #[arg(long)]
        kind: String,
    },

    /// Validate the configuration file
    Validate,
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

    log::info!("stormwatch starting...");

    let config_path = cli.data_dir.join("config.toml");
    let config = Arc::new(Config::load_or_default(&config_path));
    config.validate()?;

    let store: Arc<dyn SnapshotStore> = Arc::new(LocalStore::open(&cli.data_dir).await?);
    let tracker = Arc::new(Tracker::from_config(Arc::clone(&config), Arc::clone(&store))?);

    match cli.command {
        Command::Run => {
            let mut scheduler = Scheduler::new(
                Arc::clone(&config),
                Arc::clone(&store),
                tracker.adapters().to_vec(),
                tracker.bulletin().cloned(),
            );
            scheduler.start();

            log::info!("Scheduler running; press ctrl-c to stop");
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| AppError::config(format!("signal handler failed: {e}")))?;

            scheduler.stop();
        }

        Command::Refresh => {
            let outcome = tracker.refresh().await?;
            log::info!(
                "Manual refresh: {}/{} fetches succeeded, {} storm(s) upserted",
                outcome.succeeded(),
                outcome.total_attempted(),
                outcome.storms_upserted
            );
        }

        Command::Status => {
            let status = tracker.status().await?;
            log::info!("Active storms: {}", status.active_storms);
            log::info!("Mode: {:?}", status.mode);
            for family in &status.families {
                log::info!(
                    "  {}: {:?} (last update: {})",
                    family.family,
                    family.health,
                    family
                        .last_update
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string())
                );
            }
        }

        Command::Forecast { storm } => {
            let forecast = tracker.generate_forecast(&storm).await?;
            log::info!(
                "Forecast for {}: {} path points, confidence {:.2}",
                storm,
                forecast.path_prediction.coordinates.len(),
                forecast.confidence
            );
            log::info!(
                "Landfall probability: {:.0}%{}",
                forecast.landfall.probability * 100.0,
                forecast
                    .landfall
                    .estimated_location
                    .as_deref()
                    .map(|l| format!(" near {l}"))
                    .unwrap_or_default()
            );
            println!("{}", serde_json::to_string_pretty(&forecast)?);
        }

        Command::Trend { storm } => {
            let assessment = tracker.analyze_intensification(&storm).await?;
            log::info!(
                "Intensification trend for {}: {:?} (confidence {:.2})",
                storm,
                assessment.trend,
                assessment.confidence
            );
            log::info!("Rationale: {}", assessment.rationale);
        }

        Command::Snapshot { kind } => {
            let kind = FeedKind::parse(&kind)
                .ok_or_else(|| AppError::config(format!("unknown feed kind: {kind}")))?;
            let snapshot = tracker.latest_snapshot(kind.family(), kind).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("Config OK");
            if !config.oracle.is_configured() {
                log::warn!("Oracle key not set; forecasts will be unavailable");
            }
            if !config.ocean.has_credentials() {
                log::warn!("Ocean credentials not set; ocean-field feed will be skipped");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
