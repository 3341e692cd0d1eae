//! Parallel file analysis using rayon.
//!
//! This module provides [`FileAnalyzer`], which reads and parses source files
//! in parallel and returns the extracted definitions per file.
//!
//! # Design
//!
//! Uses the "collect-then-parallelize" pattern:
//!
//! 1. Paths are collected first by [`FileWalker`](crate::FileWalker)
//! 2. `FileAnalyzer` processes paths in parallel with `rayon::par_iter()`
//! 3. One [`PyParser`] per worker thread is created via `map_init()`
//! 4. Results keep the input order, so output is deterministic

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use payreg_py_parser::{ParseError, ParsedModule, PyParser};
use rayon::prelude::*;
use tracing::debug;

use crate::error::ScanError;
use crate::stats::ScanStats;

/// Definitions extracted from one source file.
#[derive(Debug)]
pub struct SourceFile {
    /// Path relative to the scan root.
    pub path: Utf8PathBuf,

    /// Dotted module name derived from [`path`](Self::path).
    pub module: String,

    /// Extracted classes and decorated functions.
    pub parsed: ParsedModule,
}

/// Parallel file analyzer.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use payreg_scanner::{FileAnalyzer, FileWalker, ScanStats};
///
/// let root = Utf8Path::new("./service");
/// let paths = FileWalker::new(root)?.collect_paths()?;
/// let stats = ScanStats::new();
///
/// for (path, result) in FileAnalyzer::new(root).analyze_files(&paths, &stats) {
///     match result {
///         Ok(file) => println!("{}: {} classes", file.module, file.parsed.classes.len()),
///         Err(e) => eprintln!("{path}: {e}"),
///     }
/// }
/// # Ok::<(), payreg_scanner::ScanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileAnalyzer {
    root: Utf8PathBuf,
}

impl FileAnalyzer {
    /// Creates an analyzer resolving module names against `root`.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
        }
    }

    /// Analyzes multiple files in parallel.
    ///
    /// Returns one `(path, result)` per input path, in input order. Read and
    /// parse failures are returned per file and counted in `stats`.
    #[must_use]
    pub fn analyze_files(
        &self,
        paths: &[Utf8PathBuf],
        stats: &ScanStats,
    ) -> Vec<(Utf8PathBuf, Result<SourceFile, ScanError>)> {
        paths
            .par_iter()
            .map_init(
                || PyParser::new().ok(),
                |parser, path| {
                    let result = match parser.as_mut() {
                        Some(parser) => self.analyze_with(parser, path),
                        None => Err(ScanError::parse(path.clone(), ParseError::LanguageInit)),
                    };
                    match &result {
                        Ok(_) => stats.increment_parsed(),
                        Err(ScanError::Read { .. }) => stats.increment_read_errors(),
                        Err(_) => stats.increment_parse_errors(),
                    }
                    (path.clone(), result)
                },
            )
            .collect()
    }

    /// Analyzes a single file with a fresh parser.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Read`] if the file cannot be read
    /// - [`ScanError::Parse`] if the file has syntax errors
    pub fn analyze_single(&self, path: &Utf8Path) -> Result<SourceFile, ScanError> {
        let mut parser = PyParser::new().map_err(|e| ScanError::parse(path, e))?;
        self.analyze_with(&mut parser, path)
    }

    fn analyze_with(
        &self,
        parser: &mut PyParser,
        path: &Utf8Path,
    ) -> Result<SourceFile, ScanError> {
        let bytes = fs::read(path.as_std_path()).map_err(|e| ScanError::read(path, e))?;
        let source = String::from_utf8_lossy(&bytes);

        let parsed = parser.parse(&source).map_err(|e| ScanError::parse(path, e))?;

        let relative = path.strip_prefix(&self.root).unwrap_or(path).to_owned();
        let module = module_name(&relative);
        debug!(
            path = %relative,
            classes = parsed.classes.len(),
            functions = parsed.functions.len(),
            "Analyzed file"
        );

        Ok(SourceFile {
            path: relative,
            module,
            parsed,
        })
    }
}

/// Dotted module name of a root-relative path.
///
/// The extension is dropped and the remaining components are joined with
/// `.`; package `__init__` files keep their `__init__` component.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use payreg_scanner::module_name;
///
/// assert_eq!(module_name(Utf8Path::new("app/routes/notes.py")), "app.routes.notes");
/// assert_eq!(module_name(Utf8Path::new("app/__init__.py")), "app.__init__");
/// ```
#[must_use]
pub fn module_name(relative: &Utf8Path) -> String {
    relative
        .with_extension("")
        .iter()
        .collect::<Vec<_>>()
        .join(".")
}
