//! Source scanner for route handlers and the payload models they accept.
//!
//! This crate walks a Python source tree, parses it with
//! `payreg-py-parser`, and turns the result into a [`Summary`]: one
//! [`PayloadShape`] per route decorator, a drift report against the previous
//! run, and two local artifacts.
//!
//! # Overview
//!
//! The main entry point is [`PayloadScanner`], which combines:
//!
//! - [`FileWalker`]: directory traversal with excluded directory names
//! - [`FileAnalyzer`]: parallel parsing with rayon, one parser per worker
//! - [`RegistryBuilder`]: model classification into a per-run registry
//! - [`ShapeBuilder`]: parameter resolution and example synthesis
//! - [`compute_drift`]: comparison against the last written summary
//! - [`ArtifactWriter`]: the JSON and markdown artifacts
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use payreg_core::Config;
//! use payreg_scanner::PayloadScanner;
//!
//! let mut config = Config::default();
//! config.scan.root_path = Utf8PathBuf::from("./service");
//!
//! let outcome = PayloadScanner::new(config)?.run()?;
//! for entry in &outcome.summary.drift.changed {
//!     println!("changed: {entry}");
//! }
//! # Ok::<(), payreg_scanner::ScanError>(())
//! ```
//!
//! [`Summary`]: payreg_core::Summary
//! [`PayloadShape`]: payreg_core::PayloadShape

#![deny(clippy::all)]
#![warn(missing_docs)]

mod analyzer;
mod artifacts;
mod drift;
mod error;
mod examples;
mod pipeline;
mod registry;
mod shapes;
mod stats;
mod walker;

pub use analyzer::{FileAnalyzer, SourceFile, module_name};
pub use artifacts::{
    ArtifactWriter, load_realm_metadata, load_registered_routes, read_summary, render_markdown,
};
pub use drift::compute_drift;
pub use error::ScanError;
pub use examples::{ExampleStrategy, HeuristicExamples};
pub use pipeline::{PayloadScanner, ScanOutcome};
pub use registry::RegistryBuilder;
pub use shapes::{MAX_SHAPE_SCORE, ShapeBuilder, shape_score};
pub use stats::{ScanStats, StatsSnapshot};
pub use walker::FileWalker;
