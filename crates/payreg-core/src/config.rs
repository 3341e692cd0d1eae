//! Configuration structures for the payload registry scanner.
//!
//! This module provides configuration types for all components of the application:
//!
//! - [`ScanConfig`] - Source walking and syntax classification rules
//! - [`ArtifactConfig`] - Where local artifacts and review logs live
//! - [`SyncConfig`] - External store tables, schemas, and discovery helpers
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] and deserialize with
//! `#[serde(default)]`, so a configuration file only needs the keys it changes.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the source walker and syntax extractor.
///
/// # Examples
///
/// ```
/// use payreg_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.exclude_dirs.contains(&"node_modules".to_owned()));
/// assert_eq!(config.file_extensions, vec!["py"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory of the source tree to scan.
    pub root_path: Utf8PathBuf,

    /// Directory names that are never descended into.
    pub exclude_dirs: Vec<String>,

    /// File extensions (without the leading dot) that are parsed.
    pub file_extensions: Vec<String>,

    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,

    /// Whether `.gitignore` and hidden-file rules prune the walk.
    pub respect_gitignore: bool,

    /// Decorator attribute names that mark a route handler, matched ignoring case.
    pub route_methods: Vec<String>,

    /// Base class names that make a class a schema model, matched literally.
    pub schema_bases: Vec<String>,

    /// Class decorator names that make a class a schema model.
    pub dataclass_markers: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: Utf8PathBuf::from("."),
            exclude_dirs: [".venv", "venv", "node_modules", "__pycache__", ".git"]
                .map(str::to_owned)
                .to_vec(),
            file_extensions: vec!["py".to_owned()],
            follow_links: false,
            respect_gitignore: false,
            route_methods: ["get", "post", "put", "patch", "delete"]
                .map(str::to_owned)
                .to_vec(),
            schema_bases: [
                "BaseModel",
                "BaseSettings",
                "pydantic.BaseModel",
                "pydantic.BaseSettings",
            ]
            .map(str::to_owned)
            .to_vec(),
            dataclass_markers: vec!["dataclass".to_owned()],
        }
    }
}

/// Configuration for local artifacts.
///
/// Relative paths are resolved against the scan root by [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding the payload map, route list, and review logs.
    pub output_dir: Utf8PathBuf,

    /// File name of the structured summary.
    pub payload_json: String,

    /// File name of the human-readable summary.
    pub payload_markdown: String,

    /// File name of the pre-collected registered-route list.
    pub routes_file: String,

    /// Realm metadata file, relative to the scan root.
    pub realm_file: Utf8PathBuf,

    /// Prefix shared by freeform review log files.
    pub review_log_prefix: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("analysis"),
            payload_json: "payload_map.json".to_owned(),
            payload_markdown: "payload_map.md".to_owned(),
            routes_file: "routes.json".to_owned(),
            realm_file: Utf8PathBuf::from("realm.json"),
            review_log_prefix: "review_log_".to_owned(),
        }
    }
}

/// Configuration for synchronizing artifacts into the external store.
///
/// # Examples
///
/// ```
/// use payreg_core::SyncConfig;
///
/// let config = SyncConfig::default();
/// assert_eq!(config.registry_table, "payload_registry");
/// assert_eq!(config.discovery_helpers[0], "list_tables_ext");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Schema holding the registry, documents, and event tables.
    pub registry_schema: String,

    /// Per-table registry, keyed by `table_name`.
    pub registry_table: String,

    /// Document table, keyed by `name`.
    pub documents_table: String,

    /// Append-only audit table.
    pub events_table: String,

    /// Schemas whose tables survive discovery when rows carry a schema name.
    pub allowed_schemas: Vec<String>,

    /// Remote procedures tried in order until one returns rows.
    pub discovery_helpers: Vec<String>,

    /// How many of the most recent review logs are attached as documents.
    pub latest_logs_limit: usize,

    /// Timeout applied to each store request.
    pub request_timeout_secs: u64,

    /// `event_type` written with each audit row.
    pub event_type: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            registry_schema: "kitenga".to_owned(),
            registry_table: "payload_registry".to_owned(),
            documents_table: "analysis_documents".to_owned(),
            events_table: "analysis_sync_events".to_owned(),
            allowed_schemas: ["public", "graphql_public", "kitenga"]
                .map(str::to_owned)
                .to_vec(),
            discovery_helpers: ["list_tables_ext", "list_tables_all", "list_public_tables"]
                .map(str::to_owned)
                .to_vec(),
            latest_logs_limit: 3,
            request_timeout_secs: 30,
            event_type: "repo_review".to_owned(),
        }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use payreg_core::Config;
///
/// let config = Config::default();
/// assert_eq!(config.artifact_dir().as_str(), "./analysis");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner configuration.
    pub scan: ScanConfig,

    /// Artifact configuration.
    pub artifacts: ArtifactConfig,

    /// Store synchronization configuration.
    pub sync: SyncConfig,
}

impl Config {
    /// Loads a configuration from a JSON file; absent keys keep their defaults.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_std_path()).map_err(|source| {
            ConfigError::Read {
                path: path.to_owned(),
                source,
            }
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that would make a scan meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.route_methods.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "scan.route_methods".to_owned(),
                reason: "at least one method name is required".to_owned(),
            });
        }
        if self.scan.file_extensions.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "scan.file_extensions".to_owned(),
                reason: "at least one extension is required".to_owned(),
            });
        }
        Ok(())
    }

    /// Checks that the scan root exists and is a directory.
    pub fn validate_root(&self) -> Result<(), ConfigError> {
        ConfigError::check_root(&self.scan.root_path)
    }

    /// The artifact directory, resolved against the scan root when relative.
    #[must_use]
    pub fn artifact_dir(&self) -> Utf8PathBuf {
        self.resolve(&self.artifacts.output_dir)
    }

    /// Path of the structured summary artifact.
    #[must_use]
    pub fn payload_json_path(&self) -> Utf8PathBuf {
        self.artifact_dir().join(&self.artifacts.payload_json)
    }

    /// Path of the human-readable summary artifact.
    #[must_use]
    pub fn payload_markdown_path(&self) -> Utf8PathBuf {
        self.artifact_dir().join(&self.artifacts.payload_markdown)
    }

    /// Path of the registered-route list.
    #[must_use]
    pub fn routes_path(&self) -> Utf8PathBuf {
        self.artifact_dir().join(&self.artifacts.routes_file)
    }

    /// Path of the realm metadata file.
    #[must_use]
    pub fn realm_path(&self) -> Utf8PathBuf {
        self.resolve(&self.artifacts.realm_file)
    }

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.scan.root_path.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.route_methods, vec!["get", "post", "put", "patch", "delete"]);
        assert!(config.schema_bases.contains(&"pydantic.BaseModel".to_owned()));
        assert_eq!(config.dataclass_markers, vec!["dataclass"]);
        assert!(!config.respect_gitignore);
    }

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.registry_schema, "kitenga");
        assert_eq!(config.documents_table, "analysis_documents");
        assert_eq!(config.events_table, "analysis_sync_events");
        assert_eq!(config.latest_logs_limit, 3);
        assert_eq!(
            config.discovery_helpers,
            vec!["list_tables_ext", "list_tables_all", "list_public_tables"]
        );
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"sync": {"registry_schema": "custom"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.sync.registry_schema, "custom");
        assert_eq!(config.sync.registry_table, "payload_registry");
        assert_eq!(config.artifacts.payload_json, "payload_map.json");
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let mut config = Config::default();
        config.scan.root_path = Utf8PathBuf::from("/repo");
        assert_eq!(config.payload_json_path(), "/repo/analysis/payload_map.json");
        assert_eq!(config.realm_path(), "/repo/realm.json");

        config.artifacts.output_dir = Utf8PathBuf::from("/tmp/out");
        assert_eq!(config.routes_path(), "/tmp/out/routes.json");
    }

    #[test]
    fn test_validate_rejects_empty_methods() {
        let mut config = Config::default();
        config.scan.route_methods.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scan.route_methods"));
    }
}
