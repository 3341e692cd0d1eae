//! Directory traversal for Python source files.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to walk
//! the source tree and collect the files to analyse.
//!
//! # Features
//!
//! - Never descends into excluded directory names (`.venv`, `node_modules`, ...)
//! - Filters by file extension (`.py` by default)
//! - Optionally honours `.gitignore` and hidden-file rules
//! - Converts paths to UTF-8 [`Utf8PathBuf`](camino::Utf8PathBuf)
//! - Returns paths sorted, so later stages see files in a stable order

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use payreg_core::{ConfigError, ScanConfig};

use crate::error::ScanError;

/// A file walker that discovers source files in a directory tree.
///
/// The walker collects all paths first (single-threaded, I/O bound); the
/// paths are then parsed in parallel by [`FileAnalyzer`](crate::FileAnalyzer).
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use payreg_scanner::FileWalker;
///
/// let walker = FileWalker::new(Utf8Path::new("./service"))?
///     .with_exclude_dirs(&["migrations".to_owned()]);
/// for path in walker.collect_paths()? {
///     println!("Found: {path}");
/// }
/// # Ok::<(), payreg_scanner::ScanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Directory names never descended into.
    exclude_dirs: Vec<String>,
    /// Extensions (without dot) of files to collect.
    extensions: Vec<String>,
    /// Whether to follow symbolic links.
    follow_links: bool,
    /// Whether `.gitignore` and hidden-file rules apply.
    respect_gitignore: bool,
}

impl FileWalker {
    /// Creates a walker for `.py` files with no excluded directories.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root path doesn't exist or
    /// isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        ConfigError::check_root(root)?;

        Ok(Self {
            root: root.to_owned(),
            exclude_dirs: Vec::new(),
            extensions: vec!["py".to_owned()],
            follow_links: false,
            respect_gitignore: false,
        })
    }

    /// Creates a walker from the scan section of the configuration.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        Ok(Self::new(&config.root_path)?
            .with_exclude_dirs(&config.exclude_dirs)
            .with_extensions(&config.file_extensions)
            .with_follow_links(config.follow_links)
            .with_gitignore(config.respect_gitignore))
    }

    /// Adds directory names to skip during traversal.
    #[must_use]
    pub fn with_exclude_dirs(mut self, dirs: &[String]) -> Self {
        self.exclude_dirs.extend(dirs.iter().cloned());
        self
    }

    /// Replaces the collected file extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Configures whether `.gitignore` and hidden-file rules prune the walk.
    #[must_use]
    pub const fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Collects all matching file paths, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    /// Returns [`ScanError::NonUtf8Path`] if a non-UTF-8 path is encountered.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;

            if !self.has_source_extension(utf8_path) {
                continue;
            }

            paths.push(utf8_path.to_owned());
        }

        paths.sort();
        Ok(paths)
    }

    fn build_walker(&self) -> ignore::Walk {
        let excluded = self.exclude_dirs.clone();
        WalkBuilder::new(&self.root)
            .standard_filters(self.respect_gitignore)
            .follow_links(self.follow_links)
            .threads(1)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                if !is_dir || entry.depth() == 0 {
                    return true;
                }
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !excluded.iter().any(|d| d == name))
            })
            .build()
    }

    fn has_source_extension(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn walker(exclude: &[&str]) -> FileWalker {
        FileWalker {
            root: Utf8PathBuf::from("."),
            exclude_dirs: exclude.iter().map(|d| (*d).to_owned()).collect(),
            extensions: vec!["py".to_owned()],
            follow_links: false,
            respect_gitignore: false,
        }
    }

    #[test]
    fn test_has_source_extension() {
        let walker = walker(&[]);
        assert!(walker.has_source_extension(Utf8Path::new("app/main.py")));
        assert!(!walker.has_source_extension(Utf8Path::new("app/main.pyc")));
        assert!(!walker.has_source_extension(Utf8Path::new("README")));
    }

    #[test]
    fn test_collect_paths_sorted_and_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        for rel in [
            "b/routes.py",
            "a/models.py",
            "a/notes.txt",
            ".venv/lib/site.py",
            "pkg/__pycache__/cached.py",
            ".hidden/config.py",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "x = 1\n").unwrap();
        }

        let config = ScanConfig {
            root_path: root.to_owned(),
            ..ScanConfig::default()
        };
        let paths = FileWalker::from_config(&config).unwrap().collect_paths().unwrap();
        let relative: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().as_str().to_owned())
            .collect();
        assert_eq!(relative, vec![".hidden/config.py", "a/models.py", "b/routes.py"]);
    }

    #[test]
    fn test_missing_root() {
        let err = FileWalker::new(Utf8Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.is_fatal());
    }
}
