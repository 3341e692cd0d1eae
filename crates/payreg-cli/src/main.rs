//! CLI entry point for the payload registry scanner.
//!
//! This binary scans a Python service for route handlers and the payload
//! models they accept, writes the payload map artifacts, and syncs them into
//! the external store when credentials are available.
//!
//! # Usage
//!
//! ```bash
//! payreg [OPTIONS] <COMMAND>
//!
//! # Scan, write artifacts, and sync
//! payreg scan --root /path/to/service
//!
//! # Scan only, marking routes from a pre-collected list
//! payreg scan --no-sync --routes analysis/routes.json
//!
//! # Re-sync the last written summary
//! payreg sync
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::fs::{self, File};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr, eyre};
use payreg_core::{Config, Summary};
use payreg_scanner::{ArtifactWriter, PayloadScanner, ScanOutcome, load_registered_routes};
use payreg_sync::{RestStoreClient, StoreClient, SyncCoordinator, SyncOutcome};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Maps the payloads accepted by a Python service's route handlers.
///
/// Writes `payload_map.json` and `payload_map.md` into the artifact
/// directory, reports drift against the previous scan, and syncs the result
/// into the external store.
#[derive(Parser)]
#[command(name = "payreg", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Root directory of the service to scan.
    #[arg(short, long, global = true, env = "PAYREG_ROOT")]
    root: Option<Utf8PathBuf>,

    /// JSON configuration file; absent keys keep their defaults.
    #[arg(short, long, global = true, env = "PAYREG_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Artifact directory, relative to the root unless absolute.
    #[arg(long, global = true)]
    artifact_dir: Option<Utf8PathBuf>,

    /// Base URL of the external store.
    #[arg(long, global = true, env = payreg_sync::URL_ENV)]
    store_url: Option<String>,

    /// Service key for the external store.
    #[arg(long, global = true, env = payreg_sync::KEY_ENV, hide_env_values = true)]
    store_key: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan the source tree, write artifacts, and sync them.
    Scan {
        /// Skip the external store sync.
        #[arg(long)]
        no_sync: bool,

        /// Registered-route list to use instead of the artifact directory's.
        #[arg(long, value_name = "FILE")]
        routes: Option<Utf8PathBuf>,
    },

    /// Sync the last written summary without rescanning.
    Sync,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber.
///
/// Respects `RUST_LOG` if set; otherwise uses `debug` with `--verbose` and
/// `info` by default. When `review_log` is given, every event is also
/// appended to that file without ANSI colours.
fn init_tracing(verbose: bool, review_log: Option<File>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,ignore=warn"))
    });

    let file_layer = review_log.map(|file| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .with(filter)
        .init();
}

/// Opens this run's review log, `<prefix><YYYYmmdd_HHMMSS>_payload.md`.
///
/// Returns `None` when the file cannot be created; logging then goes to
/// stdout only.
fn open_review_log(config: &Config) -> Option<(Utf8PathBuf, File)> {
    let dir = config.artifact_dir();
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}{stamp}_payload.md", config.artifacts.review_log_prefix));

    fs::create_dir_all(dir.as_std_path()).ok()?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(path.as_std_path())
        .ok()?;
    Some((path, file))
}

/// Builds a [`Config`] from the optional config file and CLI overrides.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load configuration from {path}"))?,
        None => Config::default(),
    };

    if let Some(root) = &cli.root {
        config.scan.root_path.clone_from(root);
    }
    if let Some(dir) = &cli.artifact_dir {
        config.artifacts.output_dir.clone_from(dir);
    }

    config.validate()?;
    config.validate_root()?;
    Ok(config)
}

/// Builds the store client from the CLI credentials, if both are present.
fn store_client(cli: &Cli, config: &Config) -> color_eyre::Result<Option<Arc<dyn StoreClient>>> {
    let timeout = Duration::from_secs(config.sync.request_timeout_secs);
    let client = RestStoreClient::from_credentials(
        cli.store_url.as_deref(),
        cli.store_key.as_deref(),
        timeout,
    )?;
    Ok(client.map(|c| Arc::new(c) as Arc<dyn StoreClient>))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Scans on a blocking worker, writes artifacts, then syncs unless disabled.
async fn run_scan(
    cli: &Cli,
    config: Config,
    no_sync: bool,
    routes: Option<&Utf8Path>,
) -> color_eyre::Result<()> {
    let mut scanner = PayloadScanner::new(config.clone())?;
    if let Some(path) = routes {
        scanner = scanner.with_registered_routes(load_registered_routes(path));
    }

    let outcome = tokio::task::spawn_blocking(move || scanner.run()).await??;
    print_scan_summary(&outcome, &config);

    if no_sync {
        info!("Store sync disabled");
        return Ok(());
    }

    let sync = run_sync_for(cli, &config, &outcome.summary).await?;
    print_sync_summary(&sync);
    Ok(())
}

/// Re-syncs the summary left by the last scan.
async fn run_sync(cli: &Cli, config: Config) -> color_eyre::Result<()> {
    let writer = ArtifactWriter::from_config(&config);
    let summary = payreg_scanner::read_summary(writer.json_path())
        .wrap_err_with(|| format!("Failed to read {}", writer.json_path()))?
        .ok_or_else(|| eyre!("No summary at {}; run `payreg scan` first", writer.json_path()))?;

    info!(timestamp = %summary.timestamp, "Loaded summary");
    let sync = run_sync_for(cli, &config, &summary).await?;
    print_sync_summary(&sync);
    Ok(())
}

async fn run_sync_for(
    cli: &Cli,
    config: &Config,
    summary: &Summary,
) -> color_eyre::Result<SyncOutcome> {
    let client = store_client(cli, config)?;
    let coordinator = SyncCoordinator::new(client, config.clone());
    Ok(coordinator.sync(summary).await)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints the scan result.
fn print_scan_summary(outcome: &ScanOutcome, config: &Config) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let summary = &outcome.summary;
    let stats = &outcome.stats;

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Payload Registry");
    let _ = writeln!(handle, "================");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Files scanned:   {}", stats.parsed);
    let _ = writeln!(handle, "Files skipped:   {}", stats.skipped());
    let _ = writeln!(handle, "Models found:    {}", stats.models);
    let _ = writeln!(handle, "Payload shapes:  {}", summary.payload_shapes.len());
    let _ = writeln!(handle, "Shape score:     {} / 10", summary.shape_score_total);
    let _ = writeln!(handle);
    for (title, entries) in summary.drift.sections() {
        let _ = writeln!(handle, "{title}: {}", entries.len());
        for entry in entries {
            let _ = writeln!(handle, "  {entry}");
        }
    }
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Artifacts: {}", config.artifact_dir());

    if !outcome.errors.is_empty() {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = writeln!(handle);
        let _ = writeln!(handle, "Skipped files ({}):", outcome.errors.len());
        for (path, error) in &outcome.errors {
            let _ = writeln!(handle, "  {path} - {error}");
        }
    }
}

/// Prints the sync result.
fn print_sync_summary(outcome: &SyncOutcome) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    match outcome.error {
        Some(tag) => {
            let _ = writeln!(handle, "Store sync skipped: {tag}");
        }
        None => {
            let _ = writeln!(
                handle,
                "Store sync: {} tables, {} documents",
                outcome.synced_tables.len(),
                outcome.document_refs.len()
            );
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments and resolve configuration
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    // 3. Initialize tracing; scans also log to a review log
    let review_log = match &cli.command {
        Commands::Scan { .. } => open_review_log(&config),
        Commands::Sync => None,
    };
    let review_log_path = review_log.as_ref().map(|(path, _)| path.clone());
    init_tracing(cli.verbose, review_log.map(|(_, file)| file));
    match &review_log_path {
        Some(path) => info!(path = %path, "Writing review log"),
        None if matches!(cli.command, Commands::Scan { .. }) => {
            warn!("Review log unavailable; logging to stdout only");
        }
        None => {}
    }

    info!(root = %config.scan.root_path, "Payload registry run started");

    // 4. Route to the command
    let result = match &cli.command {
        Commands::Scan { no_sync, routes } => {
            run_scan(&cli, config, *no_sync, routes.as_deref()).await
        }
        Commands::Sync => run_sync(&cli, config).await,
    };

    info!(ok = result.is_ok(), "Payload registry run finished");
    result
}
