//! The persisted run summary and its drift report.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::route::PayloadShape;

/// Structural difference between two successive payload-shape sets.
///
/// Each list is sorted and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftReport {
    /// `"METHOD path"` for identities only in the current run.
    pub added: Vec<String>,

    /// `"METHOD path"` for identities only in the previous run.
    pub removed: Vec<String>,

    /// `"METHOD path → function"` for identities whose signature changed.
    pub changed: Vec<String>,
}

impl DriftReport {
    /// Returns `true` when nothing was added, removed, or changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// The three lists with their display names, in rendering order.
    #[must_use]
    pub fn sections(&self) -> [(&'static str, &[String]); 3] {
        [
            ("Added", self.added.as_slice()),
            ("Removed", self.removed.as_slice()),
            ("Changed", self.changed.as_slice()),
        ]
    }
}

/// One run's persisted output.
///
/// The previous run's summary, read back from the structured artifact, is the
/// only state carried between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    /// UTC scan time, ISO-8601 without offset.
    pub timestamp: String,

    /// `min(10, number of payload shapes)`.
    pub shape_score_total: u8,

    /// Opaque realm metadata passed through from the source tree.
    pub realm_metadata: Value,

    /// Every discovered route handler.
    pub payload_shapes: Vec<PayloadShape>,

    /// Drift against the previous summary.
    pub drift: DriftReport,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            timestamp: String::new(),
            shape_score_total: 0,
            realm_metadata: Value::Object(Map::new()),
            payload_shapes: Vec::new(),
            drift: DriftReport::default(),
        }
    }
}

impl Summary {
    /// Aggregate view attached to every synced registry row and event.
    #[must_use]
    pub fn snapshot(&self) -> SummarySnapshot {
        SummarySnapshot {
            timestamp: self.timestamp.clone(),
            shape_score_total: self.shape_score_total,
            payload_shapes_count: self.payload_shapes.len(),
            drift: self.drift.clone(),
            realm_metadata: self.realm_metadata.clone(),
        }
    }
}

/// Aggregate summary without the per-route detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySnapshot {
    /// Scan time of the summarized run.
    pub timestamp: String,

    /// Aggregate shape score.
    pub shape_score_total: u8,

    /// Number of payload shapes in the run.
    pub payload_shapes_count: usize,

    /// Drift of the run.
    pub drift: DriftReport,

    /// Realm metadata of the run.
    pub realm_metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drift_report_snapshot() {
        let drift = DriftReport {
            added: vec!["POST /notes".to_owned()],
            removed: Vec::new(),
            changed: vec!["GET /notes → list_notes".to_owned()],
        };
        insta::assert_json_snapshot!(drift, @r#"
        {
          "added": [
            "POST /notes"
          ],
          "removed": [],
          "changed": [
            "GET /notes → list_notes"
          ]
        }
        "#);
    }

    #[test]
    fn test_summary_tolerates_missing_keys() {
        let summary: Summary = serde_json::from_str(r#"{"timestamp": "t"}"#).unwrap();
        assert_eq!(summary.timestamp, "t");
        assert!(summary.payload_shapes.is_empty());
        assert!(summary.realm_metadata.is_object());
        assert!(summary.drift.is_empty());
    }

    #[test]
    fn test_snapshot_counts_shapes() {
        let summary = Summary {
            timestamp: "2026-01-01T00:00:00.000000".to_owned(),
            shape_score_total: 2,
            payload_shapes: vec![PayloadShape::default(), PayloadShape::default()],
            ..Summary::default()
        };
        let snapshot = summary.snapshot();
        assert_eq!(snapshot.payload_shapes_count, 2);
        assert_eq!(snapshot.shape_score_total, 2);
    }
}
