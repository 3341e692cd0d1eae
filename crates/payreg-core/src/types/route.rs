//! Route handler types: parameters, payload shapes, and registered routes.

use std::collections::BTreeSet;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::FieldDescriptor;

/// One parameter of a route handler.
///
/// `model`, `model_fields`, and `example_payload` are present only when the
/// annotation resolved to a known model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteParameter {
    /// Parameter name.
    pub name: String,

    /// Annotation exactly as written; empty when unannotated.
    pub annotation_text: String,

    /// Name of the resolved model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Fields of the resolved model, in declaration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_fields: Option<Vec<FieldDescriptor>>,

    /// Example value synthesized from the model fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_payload: Option<Map<String, Value>>,
}

impl RouteParameter {
    /// Creates an unresolved parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, annotation_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation_text: annotation_text.into(),
            ..Self::default()
        }
    }

    /// Signature token `name:annotation`, falling back to the model name, then `any`.
    ///
    /// # Examples
    ///
    /// ```
    /// use payreg_core::RouteParameter;
    ///
    /// assert_eq!(RouteParameter::new("payload", "Note").signature_token(), "payload:Note");
    /// assert_eq!(RouteParameter::new("request", "").signature_token(), "request:any");
    /// ```
    #[must_use]
    pub fn signature_token(&self) -> String {
        let kind = if !self.annotation_text.is_empty() {
            self.annotation_text.as_str()
        } else {
            self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or("any")
        };
        format!("{}:{kind}", self.name)
    }
}

/// One discovered route handler and the shape of what it accepts.
///
/// `(method, path, function)` is the identity used for drift comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadShape {
    /// Route path as declared, placeholders included.
    pub path: String,

    /// Uppercase HTTP verb.
    pub method: String,

    /// Handler function name.
    pub function: String,

    /// Dotted module of the handler.
    pub module: String,

    /// Source file, relative to the scan root.
    pub source_path: Utf8PathBuf,

    /// Parameters in declaration order, `self`/`cls` excluded.
    pub parameters: Vec<RouteParameter>,

    /// Whether the route also appears in the registered-route list.
    pub registered: bool,

    /// `min(10, 1 + parameter count)`.
    pub shape_score: u8,

    /// Parameter name to example, for parameters with a non-empty example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_payload: Option<Map<String, Value>>,
}

impl PayloadShape {
    /// Identity key `"<METHOD> <path>::<function>"`.
    #[must_use]
    pub fn identity_key(&self) -> String {
        format!("{} {}::{}", self.method, self.path, self.function)
    }

    /// Display label `"METHOD path"`.
    #[must_use]
    pub fn route_label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Display label `"METHOD path → function"`.
    #[must_use]
    pub fn handler_label(&self) -> String {
        format!("{} {} → {}", self.method, self.path, self.function)
    }

    /// Order-independent parameter signature used to detect changes.
    ///
    /// Holds one [`signature_token`](RouteParameter::signature_token) per
    /// parameter plus `name.field:type` for every field of a resolved model,
    /// so editing a model's fields changes the signature of its handlers.
    #[must_use]
    pub fn normalized_signature(&self) -> BTreeSet<String> {
        let mut signature: BTreeSet<String> = self
            .parameters
            .iter()
            .map(RouteParameter::signature_token)
            .collect();
        for param in &self.parameters {
            for field in param.model_fields.iter().flatten() {
                signature.insert(format!("{}.{}:{}", param.name, field.name, field.type_text));
            }
        }
        signature
    }
}

/// A route from a separately collected route list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisteredRoute {
    /// File the route was collected from.
    pub file: String,

    /// HTTP verb.
    pub method: String,

    /// Route path.
    pub path: String,
}
