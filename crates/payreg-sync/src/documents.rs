//! Local artifact documents synced alongside the registry.
//!
//! A fixed set of known artifact files is attached when present, followed by
//! the most recent freeform review logs. JSON artifacts carry their parsed
//! content; markdown artifacts carry their raw text.

use std::fs;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use payreg_core::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Value of `metadata.source` for known artifacts.
pub const ARTIFACT_SOURCE: &str = "analysis_runner";

/// Value of `metadata.source` for review logs.
pub const REVIEW_LOG_SOURCE: &str = "review_log";

/// How a document's body is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Parsed JSON in `content`.
    Json,
    /// Raw text in `text_content`.
    Markdown,
}

/// Provenance attached to every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Path relative to the scan root.
    pub path: String,
    /// When the document was prepared.
    pub generated_at: String,
    /// [`ARTIFACT_SOURCE`] or [`REVIEW_LOG_SOURCE`].
    pub source: String,
    /// Timestamp of the summary the document belongs to; absent for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_timestamp: Option<String>,
}

/// One row of the documents table, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDocument {
    /// Unique document name.
    pub name: String,
    /// Body format.
    pub format: DocumentFormat,
    /// Parsed body of a JSON document.
    pub content: Option<Value>,
    /// Raw body of a markdown document.
    pub text_content: Option<String>,
    /// Provenance.
    pub metadata: DocumentMetadata,
}

/// Collects the documents to sync from the artifact directory.
///
/// # Examples
///
/// ```no_run
/// use payreg_core::Config;
/// use payreg_sync::DocumentCollector;
///
/// let config = Config::default();
/// let documents = DocumentCollector::from_config(&config)
///     .collect("2026-01-01T00:00:00.000000", "2026-01-01T00:00:01.000000");
/// for doc in &documents {
///     println!("{} ({:?})", doc.name, doc.format);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DocumentCollector {
    root: Utf8PathBuf,
    artifact_dir: Utf8PathBuf,
    known: Vec<(String, String, DocumentFormat)>,
    log_prefix: String,
    log_limit: usize,
}

impl DocumentCollector {
    /// Creates a collector for the configured artifact directory.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let artifacts = &config.artifacts;
        let known = [
            ("payload_map_json", artifacts.payload_json.as_str(), DocumentFormat::Json),
            ("payload_map_md", artifacts.payload_markdown.as_str(), DocumentFormat::Markdown),
            ("routes_json", artifacts.routes_file.as_str(), DocumentFormat::Json),
            ("routes_summary", "routes_summary.json", DocumentFormat::Json),
            ("routes_compact", "routes_compact.md", DocumentFormat::Markdown),
            ("routes_md", "routes.md", DocumentFormat::Markdown),
            ("mcp_tools_manifest", "mcp_tools_manifest.json", DocumentFormat::Json),
        ]
        .into_iter()
        .map(|(name, file, format)| (name.to_owned(), file.to_owned(), format))
        .collect();

        Self {
            root: config.scan.root_path.clone(),
            artifact_dir: config.artifact_dir(),
            known,
            log_prefix: artifacts.review_log_prefix.clone(),
            log_limit: config.sync.latest_logs_limit,
        }
    }

    /// Known artifacts in declared order, then review logs oldest first.
    ///
    /// Missing files are skipped silently; JSON files that fail to parse are
    /// skipped with a warning.
    #[must_use]
    pub fn collect(&self, summary_timestamp: &str, generated_at: &str) -> Vec<ArtifactDocument> {
        let mut documents = Vec::new();

        for (name, file, format) in &self.known {
            let path = self.artifact_dir.join(file);
            let Some(text) = read_lossy(&path) else {
                continue;
            };
            let (content, text_content) = match format {
                DocumentFormat::Json => match serde_json::from_str::<Value>(&text) {
                    Ok(value) => (Some(value), None),
                    Err(e) => {
                        warn!(path = %path, error = %e, "Skipping unparsable JSON artifact");
                        continue;
                    }
                },
                DocumentFormat::Markdown => (None, Some(text)),
            };
            documents.push(ArtifactDocument {
                name: name.clone(),
                format: *format,
                content,
                text_content,
                metadata: DocumentMetadata {
                    path: self.relative(&path),
                    generated_at: generated_at.to_owned(),
                    source: ARTIFACT_SOURCE.to_owned(),
                    summary_timestamp: Some(summary_timestamp.to_owned()),
                },
            });
        }

        for path in self.latest_logs() {
            let Some(text) = read_lossy(&path) else {
                continue;
            };
            documents.push(ArtifactDocument {
                name: path.file_stem().unwrap_or(path.as_str()).to_owned(),
                format: DocumentFormat::Markdown,
                content: None,
                text_content: Some(text),
                metadata: DocumentMetadata {
                    path: self.relative(&path),
                    generated_at: generated_at.to_owned(),
                    source: REVIEW_LOG_SOURCE.to_owned(),
                    summary_timestamp: None,
                },
            });
        }

        debug!(count = documents.len(), "Prepared artifact documents");
        documents
    }

    /// The `log_limit` most recently modified review logs, oldest first.
    fn latest_logs(&self) -> Vec<Utf8PathBuf> {
        let Ok(entries) = self.artifact_dir.read_dir_utf8() else {
            return Vec::new();
        };

        let mut logs: Vec<(SystemTime, Utf8PathBuf)> = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                name.starts_with(&self.log_prefix) && name.ends_with(".md")
            })
            .filter_map(|entry| {
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                Some((modified, entry.path().to_owned()))
            })
            .collect();

        logs.sort();
        let skip = logs.len().saturating_sub(self.log_limit);
        logs.into_iter().skip(skip).map(|(_, path)| path).collect()
    }

    fn relative(&self, path: &Utf8Path) -> String {
        path.strip_prefix(&self.root).unwrap_or(path).to_string()
    }
}

fn read_lossy(path: &Utf8Path) -> Option<String> {
    let bytes = fs::read(path.as_std_path()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
