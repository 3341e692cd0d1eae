//! Example payload synthesis for resolved models.
//!
//! The shape builder asks an [`ExampleStrategy`] for one value per model
//! field. [`HeuristicExamples`] is the default strategy: it classifies the raw
//! annotation text by case-insensitive substring, first match wins.
//!
//! | Annotation contains | Example |
//! |---------------------|---------|
//! | `int`, `float`, `decimal` | `0` |
//! | `bool` | `false` |
//! | `list`, `tuple` | `[]` |
//! | `dict`, `mapping` | `{}` |
//! | anything else (non-empty) | `"example_<field>"` |
//! | nothing | `"example"` |
//!
//! Substring matching is literal: `Point` contains `int` and yields `0`.

use payreg_core::FieldDescriptor;
use serde_json::{Map, Value};

/// Produces an example value from a field's name and annotation text.
pub trait ExampleStrategy: Send + Sync {
    /// Example value for one field.
    fn example_value(&self, field_name: &str, type_text: &str) -> Value;

    /// Example object for a model: one entry per field, in field order.
    fn example_payload(&self, fields: &[FieldDescriptor]) -> Map<String, Value> {
        fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    self.example_value(&field.name, &field.type_text),
                )
            })
            .collect()
    }
}

/// Substring heuristic over the raw annotation text.
///
/// # Examples
///
/// ```
/// use payreg_scanner::{ExampleStrategy, HeuristicExamples};
/// use serde_json::json;
///
/// let examples = HeuristicExamples;
/// assert_eq!(examples.example_value("count", "int"), json!(0));
/// assert_eq!(examples.example_value("title", "str"), json!("example_title"));
/// assert_eq!(examples.example_value("anything", ""), json!("example"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExamples;

impl ExampleStrategy for HeuristicExamples {
    fn example_value(&self, field_name: &str, type_text: &str) -> Value {
        let hint = type_text.to_lowercase();
        let has = |needle: &str| hint.contains(needle);

        if has("int") || has("float") || has("decimal") {
            Value::from(0)
        } else if has("bool") {
            Value::Bool(false)
        } else if has("list") || has("tuple") {
            Value::Array(Vec::new())
        } else if has("dict") || has("mapping") {
            Value::Object(Map::new())
        } else if !hint.is_empty() {
            Value::String(format!("example_{field_name}"))
        } else {
            Value::String("example".to_owned())
        }
    }
}
