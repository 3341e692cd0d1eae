//! Local artifacts: the structured summary, its markdown rendering, and the
//! optional inputs read alongside them.
//!
//! Both summary artifacts are overwritten in full on every run.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use payreg_core::{Config, RegisteredRoute, Summary};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ScanError;

/// Writes the structured and human-readable summary artifacts.
///
/// # Examples
///
/// ```no_run
/// use payreg_core::{Config, Summary};
/// use payreg_scanner::ArtifactWriter;
///
/// let writer = ArtifactWriter::from_config(&Config::default());
/// writer.write(&Summary::default())?;
/// # Ok::<(), payreg_scanner::ScanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    json_path: Utf8PathBuf,
    markdown_path: Utf8PathBuf,
}

impl ArtifactWriter {
    /// Creates a writer for explicit artifact paths.
    #[must_use]
    pub fn new(json_path: Utf8PathBuf, markdown_path: Utf8PathBuf) -> Self {
        Self {
            json_path,
            markdown_path,
        }
    }

    /// Creates a writer for the configured artifact paths.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.payload_json_path(), config.payload_markdown_path())
    }

    /// Path of the structured artifact.
    #[must_use]
    pub fn json_path(&self) -> &Utf8Path {
        &self.json_path
    }

    /// Path of the markdown artifact.
    #[must_use]
    pub fn markdown_path(&self) -> &Utf8Path {
        &self.markdown_path
    }

    /// Writes both artifacts, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Artifact`] if either file cannot be written.
    pub fn write(&self, summary: &Summary) -> Result<(), ScanError> {
        let json = serde_json::to_string_pretty(summary)
            .map_err(|e| ScanError::artifact(&self.json_path, e))?;
        write_file(&self.json_path, &json)?;
        write_file(&self.markdown_path, &render_markdown(summary))?;

        info!(
            json = %self.json_path,
            markdown = %self.markdown_path,
            shapes = summary.payload_shapes.len(),
            "Wrote payload artifacts"
        );
        Ok(())
    }

    /// Reads the previously written summary to use as the drift baseline.
    ///
    /// A missing artifact is an empty baseline. An unreadable or malformed
    /// one is also treated as empty, with a warning.
    #[must_use]
    pub fn load_baseline(&self) -> Summary {
        match read_summary(&self.json_path) {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                debug!(path = %self.json_path, "No previous summary; drift baseline is empty");
                Summary::default()
            }
            Err(e) => {
                warn!(
                    path = %self.json_path,
                    error = %e,
                    "Previous summary is unreadable; treating the baseline as empty"
                );
                Summary::default()
            }
        }
    }
}

/// Reads a summary artifact; `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read or does not hold a valid
/// summary.
pub fn read_summary(path: &Utf8Path) -> io::Result<Option<Summary>> {
    let text = match fs::read_to_string(path.as_std_path()) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let summary = serde_json::from_str(&text)?;
    Ok(Some(summary))
}

/// Reads the registered-route list; missing or malformed lists are empty.
#[must_use]
pub fn load_registered_routes(path: &Utf8Path) -> Vec<RegisteredRoute> {
    let Ok(text) = fs::read_to_string(path.as_std_path()) else {
        return Vec::new();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(path = %path, error = %e, "Registered-route list is malformed; ignoring it");
        Vec::new()
    })
}

/// Reads realm metadata; anything but valid JSON yields an empty object.
#[must_use]
pub fn load_realm_metadata(path: &Utf8Path) -> Value {
    fs::read_to_string(path.as_std_path())
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<(), ScanError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent.as_std_path()).map_err(|e| ScanError::artifact(path, e))?;
    }
    fs::write(path.as_std_path(), contents).map_err(|e| ScanError::artifact(path, e))
}

/// Renders the human-readable form of a summary.
#[must_use]
pub fn render_markdown(summary: &Summary) -> String {
    let mut lines: Vec<String> = vec![
        "# Payload Registry".to_owned(),
        String::new(),
        format!("**Scan time:** {}", summary.timestamp),
        format!("**Shape score:** {} / 10", summary.shape_score_total),
        String::new(),
        "## Realm Metadata".to_owned(),
    ];
    if let Value::Object(realm) = &summary.realm_metadata {
        let mut keys: Vec<_> = realm.keys().collect();
        keys.sort();
        lines.extend(
            keys.into_iter()
                .map(|key| format!("- {key}: {}", display_value(&realm[key]))),
        );
    }
    lines.push(String::new());

    lines.push("## Payload Shapes".to_owned());
    for shape in &summary.payload_shapes {
        lines.push(format!("### {}", shape.handler_label()));
        lines.push(format!("- Module: {}", shape.module));
        lines.push(format!("- Source path: {}", shape.source_path));
        lines.push(format!(
            "- Registered route: {}",
            if shape.registered { "yes" } else { "no" }
        ));
        lines.push(format!("- Shape score: {}", shape.shape_score));
        if !shape.parameters.is_empty() {
            lines.push("- Parameters:".to_owned());
            for param in &shape.parameters {
                let kind = if !param.annotation_text.is_empty() {
                    param.annotation_text.as_str()
                } else {
                    param.model.as_deref().unwrap_or("any")
                };
                let mut line = format!("  - {} ({kind})", param.name);
                if let Some(fields) = param.model_fields.as_ref().filter(|f| !f.is_empty()) {
                    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
                    line.push_str(" → fields: ");
                    line.push_str(&names.join(", "));
                }
                lines.push(line);
            }
        }
        if let Some(example) = &shape.example_payload {
            lines.push("- Example payload:".to_owned());
            lines.push("```json".to_owned());
            lines.push(serde_json::to_string_pretty(example).unwrap_or_default());
            lines.push("```".to_owned());
        }
        lines.push(String::new());
    }

    lines.push("## Drift Observations".to_owned());
    for (title, entries) in summary.drift.sections() {
        lines.push(format!("- {title}: {}", entries.len()));
        lines.extend(entries.iter().map(|entry| format!("  - {entry}")));
    }
    lines.push(String::new());

    lines.push("## Notes".to_owned());
    lines.push(if summary.drift.is_empty() {
        "- No schema drift since the previous scan.".to_owned()
    } else {
        "- Schema drift detected: keep this artifact aligned with route changes.".to_owned()
    });

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
