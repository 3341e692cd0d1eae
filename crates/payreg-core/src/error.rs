//! Error types for the payreg-core crate.

use camino::Utf8PathBuf;

/// Errors raised while loading or validating a [`Config`](crate::Config).
///
/// # Examples
///
/// ```
/// use payreg_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::RootNotFound(Utf8PathBuf::from("/srv/api"));
/// assert_eq!(error.to_string(), "scan root does not exist: /srv/api");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The scan root does not exist.
    #[error("scan root does not exist: {0}")]
    RootNotFound(Utf8PathBuf),

    /// The scan root exists but is not a directory.
    #[error("scan root is not a directory: {0}")]
    RootNotDirectory(Utf8PathBuf),

    /// An option has a value that makes a scan meaningless.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// Dotted option name, e.g. `scan.route_methods`.
        option: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that was being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`Config`](crate::Config).
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        /// File that was being parsed.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Checks that `root` exists and is a directory.
    pub fn check_root(root: &camino::Utf8Path) -> Result<(), Self> {
        if !root.exists() {
            return Err(Self::RootNotFound(root.to_owned()));
        }
        if !root.is_dir() {
            return Err(Self::RootNotDirectory(root.to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::InvalidOption {
            option: "scan.route_methods".to_owned(),
            reason: "at least one method name is required".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "invalid configuration option 'scan.route_methods': \
             at least one method name is required"
        );
    }

    #[test]
    fn test_check_root() {
        let dir = std::env::temp_dir();
        let root = Utf8PathBuf::from_path_buf(dir).unwrap();
        assert!(ConfigError::check_root(&root).is_ok());

        let missing = root.join("payreg-definitely-missing-dir");
        assert!(matches!(
            ConfigError::check_root(&missing),
            Err(ConfigError::RootNotFound(_))
        ));
    }
}
