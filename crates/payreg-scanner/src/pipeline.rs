//! The local scan pipeline.
//!
//! ```text
//! FileWalker ─▶ FileAnalyzer ─▶ RegistryBuilder ─▶ ShapeBuilder ─▶ compute_drift ─▶ ArtifactWriter
//!  (paths)       (rayon)         (ModelRegistry)    (PayloadShape)   (vs. baseline)   (json + md)
//! ```
//!
//! Every stage receives what it needs as arguments; nothing is kept between
//! runs except the previously written summary artifact.

use std::sync::Arc;

use camino::Utf8PathBuf;
use payreg_core::{BareCollision, Config, RegisteredRoute, Summary, clock};
use tracing::{info, warn};

use crate::analyzer::{FileAnalyzer, SourceFile};
use crate::artifacts::{ArtifactWriter, load_realm_metadata, load_registered_routes};
use crate::drift::compute_drift;
use crate::error::ScanError;
use crate::examples::{ExampleStrategy, HeuristicExamples};
use crate::registry::RegistryBuilder;
use crate::shapes::{MAX_SHAPE_SCORE, ShapeBuilder};
use crate::stats::{ScanStats, StatsSnapshot};
use crate::walker::FileWalker;

/// Result of one scan.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The summary of this run.
    pub summary: Summary,
    /// Counters for this run.
    pub stats: StatsSnapshot,
    /// Files that were skipped, with the reason.
    pub errors: Vec<(Utf8PathBuf, ScanError)>,
    /// Bare model names defined in more than one module.
    pub collisions: Vec<BareCollision>,
}

/// Runs the walk → parse → registry → shapes → drift pipeline for one root.
///
/// # Examples
///
/// ```no_run
/// use payreg_core::Config;
/// use payreg_scanner::PayloadScanner;
///
/// let scanner = PayloadScanner::new(Config::default())?;
/// let outcome = scanner.run()?;
/// println!("{} payload shapes", outcome.summary.payload_shapes.len());
/// # Ok::<(), payreg_scanner::ScanError>(())
/// ```
#[derive(Clone)]
pub struct PayloadScanner {
    config: Config,
    strategy: Arc<dyn ExampleStrategy>,
    registered_routes: Option<Vec<RegisteredRoute>>,
    stats: Arc<ScanStats>,
}

impl PayloadScanner {
    /// Creates a scanner for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the configuration is invalid or the
    /// scan root is not an existing directory.
    pub fn new(config: Config) -> Result<Self, ScanError> {
        config.validate()?;
        config.validate_root()?;

        info!(
            root = %config.scan.root_path,
            artifacts = %config.artifact_dir(),
            "Creating payload scanner"
        );

        Ok(Self {
            config,
            strategy: Arc::new(HeuristicExamples),
            registered_routes: None,
            stats: Arc::new(ScanStats::new()),
        })
    }

    /// Replaces the example synthesis strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl ExampleStrategy + 'static) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Uses `routes` as the registered-route list instead of reading the
    /// configured route file.
    #[must_use]
    pub fn with_registered_routes(mut self, routes: Vec<RegisteredRoute>) -> Self {
        self.registered_routes = Some(routes);
        self
    }

    /// The configuration this scanner was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Live counters of the current or last scan.
    #[must_use]
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Scans and writes both artifacts, stamping the summary with the
    /// current UTC time.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`ScanError`] if the walk fails or an artifact cannot
    /// be written. Per-file failures are reported in [`ScanOutcome::errors`].
    pub fn run(&self) -> Result<ScanOutcome, ScanError> {
        self.run_at(clock::utc_timestamp())
    }

    /// Like [`run`](Self::run) with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_at(&self, timestamp: impl Into<String>) -> Result<ScanOutcome, ScanError> {
        let outcome = self.scan_at(timestamp)?;
        ArtifactWriter::from_config(&self.config).write(&outcome.summary)?;
        Ok(outcome)
    }

    /// Builds the summary without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    pub fn scan_at(&self, timestamp: impl Into<String>) -> Result<ScanOutcome, ScanError> {
        let scan = &self.config.scan;
        info!(root = %scan.root_path, "Starting scan");
        self.stats.reset();

        let walker = FileWalker::from_config(scan)?;
        let paths = walker.collect_paths()?;
        self.stats.add_discovered(paths.len() as u64);
        info!(count = paths.len(), "Collected source files");

        let analyzer = FileAnalyzer::new(walker.root());
        let (files, errors) = split_results(analyzer.analyze_files(&paths, &self.stats));

        let registry = RegistryBuilder::from_config(scan).build(&files);
        self.stats.add_models(registry.len() as u64);

        let registered = self
            .registered_routes
            .clone()
            .unwrap_or_else(|| load_registered_routes(&self.config.routes_path()));

        let shapes = ShapeBuilder::new(&registry, self.strategy.as_ref(), &scan.route_methods)
            .with_registered_routes(&registered)
            .build(&files);
        self.stats.add_handlers(shapes.len() as u64);

        let baseline = ArtifactWriter::from_config(&self.config).load_baseline();
        let drift = compute_drift(&baseline.payload_shapes, &shapes);

        let shape_score_total =
            u8::try_from(shapes.len()).map_or(MAX_SHAPE_SCORE, |n| n.min(MAX_SHAPE_SCORE));

        let summary = Summary {
            timestamp: timestamp.into(),
            shape_score_total,
            realm_metadata: load_realm_metadata(&self.config.realm_path()),
            payload_shapes: shapes,
            drift,
        };

        let stats = self.stats.snapshot();
        info!(
            files = stats.parsed,
            skipped = stats.skipped(),
            models = stats.models,
            shapes = stats.handlers,
            added = summary.drift.added.len(),
            removed = summary.drift.removed.len(),
            changed = summary.drift.changed.len(),
            "Scan complete"
        );

        Ok(ScanOutcome {
            summary,
            stats,
            errors,
            collisions: registry.collisions().to_vec(),
        })
    }
}

impl std::fmt::Debug for PayloadScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadScanner")
            .field("config", &self.config)
            .field("registered_routes", &self.registered_routes.as_ref().map(Vec::len))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn split_results(
    results: Vec<(Utf8PathBuf, Result<SourceFile, ScanError>)>,
) -> (Vec<SourceFile>, Vec<(Utf8PathBuf, ScanError)>) {
    let mut files = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (path, result) in results {
        match result {
            Ok(file) => files.push(file),
            Err(error) => {
                warn!(path = %path, error = %error, "Skipping file");
                errors.push((path, error));
            }
        }
    }
    (files, errors)
}
