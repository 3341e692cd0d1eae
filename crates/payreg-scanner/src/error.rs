//! Error types for the payreg-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! during directory traversal, file analysis, and artifact writing.

use camino::Utf8PathBuf;
use payreg_core::ConfigError;
use payreg_py_parser::ParseError;

/// Errors that can occur during scanning operations.
///
/// # Error Recovery Strategy
///
/// - **File read errors** ([`ScanError::Read`]): Log warning, skip file, continue scan
/// - **Parse errors** ([`ScanError::Parse`]): Log warning, skip file, continue scan
/// - Everything else is fatal to the scan and propagates
///
/// # Examples
///
/// ```
/// use payreg_scanner::ScanError;
///
/// fn handle_error(err: ScanError) {
///     match err {
///         ScanError::Walk(e) => eprintln!("Walk error: {e}"),
///         ScanError::Read { path, .. } => eprintln!("Read error: {path}"),
///         ScanError::Parse { path, .. } => eprintln!("Parse error: {path}"),
///         ScanError::Config(e) => eprintln!("Config error: {e}"),
///         ScanError::NonUtf8Path(p) => eprintln!("Invalid path: {}", p.display()),
///         ScanError::Artifact { path, .. } => eprintln!("Artifact error: {path}"),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a source file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a Python source file.
    #[error("failed to parse file {path}: {source}")]
    Parse {
        /// The path of the file that couldn't be parsed.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: ParseError,
    },

    /// Invalid scanner configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// Failed to write a local artifact.
    #[error("failed to write artifact {path}: {source}")]
    Artifact {
        /// The artifact path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Parse`] error.
    #[inline]
    pub fn parse(path: impl Into<Utf8PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Artifact`] error.
    #[inline]
    pub fn artifact(path: impl Into<Utf8PathBuf>, source: impl Into<std::io::Error>) -> Self {
        Self::Artifact {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if this error is recoverable (scanning can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Parse { .. })
    }

    /// Returns `true` if this error is fatal (scanning should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Artifact { path, .. } => {
                Some(path)
            }
            Self::Walk(_) | Self::Config(_) | Self::NonUtf8Path(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_scan_error_read() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err = ScanError::read("app/main.py", missing);
        assert!(err.is_recoverable());
        assert_eq!(err.path().map(|p| p.as_str()), Some("app/main.py"));
        assert!(err.to_string().contains("app/main.py"));
    }

    #[test]
    fn test_scan_error_parse() {
        let err = ScanError::parse("app/broken.py", ParseError::Syntax { line: 2, column: 5 });
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("line 2, column 5"));
    }

    #[test]
    fn test_scan_error_config_is_fatal() {
        let err = ScanError::from(ConfigError::RootNotFound(Utf8PathBuf::from("/nope")));
        assert!(err.is_fatal());
        assert!(err.path().is_none());
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_scan_error_artifact() {
        let err = ScanError::artifact("analysis/payload_map.json", io::Error::other("disk full"));
        assert!(err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_str()), Some("analysis/payload_map.json"));
    }
}
