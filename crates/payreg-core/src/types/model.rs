//! Schema model descriptors and the per-run model registry.
//!
//! A [`ModelDescriptor`] is built from a class definition found in the scanned
//! source. The [`ModelRegistry`] indexes descriptors two ways, by
//! `(module, name)` and by bare `name`, so handler annotations can be resolved
//! without an import resolver:
//!
//! ```
//! use payreg_core::{FieldDescriptor, ModelDescriptor, ModelKind, ModelRegistry};
//!
//! let mut registry = ModelRegistry::new();
//! registry.register(ModelDescriptor {
//!     name: "Note".to_owned(),
//!     module: "app.schemas".to_owned(),
//!     fields: vec![FieldDescriptor::new("title", "str", "")],
//!     kind: ModelKind::Schema,
//! });
//!
//! // Qualified lookup first, bare-name fallback second.
//! assert!(registry.resolve("app.schemas", "Note").is_some());
//! assert!(registry.resolve("app.routes", "schemas.Note").is_some());
//! assert!(registry.resolve("app.routes", "Missing").is_none());
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::FxHashMap;

/// Whether a class is validated by a schema library or is a plain data holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ModelKind {
    /// Inherits from a schema base or carries a data-class marker decorator.
    Schema,

    /// Any other class with at least one class-level field assignment.
    Plain,
}

impl ModelKind {
    /// Lowercase label used in rendered artifacts.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Plain => "plain",
        }
    }
}

/// One class-level field, with annotation and default as written in source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,

    /// Annotation source text; empty for unannotated assignments.
    pub type_text: String,

    /// Default value source text; empty when no value is assigned.
    pub default_text: String,
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        type_text: impl Into<String>,
        default_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_text: type_text.into(),
            default_text: default_text.into(),
        }
    }
}

/// A schema or data class discovered in the scanned source.
///
/// Built fresh every run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Class name.
    pub name: String,

    /// Dotted module path derived from the file location.
    pub module: String,

    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,

    /// Schema-validated or plain.
    pub kind: ModelKind,
}

/// Record of a bare-name lookup entry being replaced by a later model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BareCollision {
    /// The shared class name.
    pub name: String,

    /// Module of the descriptor that was replaced.
    pub replaced_module: String,

    /// Module of the descriptor that now answers bare lookups.
    pub module: String,
}

/// Lookup structure for resolving parameter annotations to models.
///
/// Bare-name entries follow last-write-wins: registering a second model with
/// the same class name replaces the bare entry, and the replacement is
/// recorded in [`collisions`](Self::collisions) so callers can report it.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    /// module -> class name -> descriptor.
    qualified: FxHashMap<String, FxHashMap<String, Arc<ModelDescriptor>>>,
    /// class name -> most recently registered descriptor.
    bare: FxHashMap<String, Arc<ModelDescriptor>>,
    /// Bare-name replacements in registration order.
    collisions: Vec<BareCollision>,
    /// Number of distinct qualified entries.
    len: usize,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under both its qualified and bare keys.
    ///
    /// Returns the bare-name collision this registration caused, if any.
    pub fn register(&mut self, descriptor: ModelDescriptor) -> Option<BareCollision> {
        let descriptor = Arc::new(descriptor);

        let by_name = self
            .qualified
            .entry(descriptor.module.clone())
            .or_default();
        if by_name
            .insert(descriptor.name.clone(), Arc::clone(&descriptor))
            .is_none()
        {
            self.len += 1;
        }

        let replaced = self
            .bare
            .insert(descriptor.name.clone(), Arc::clone(&descriptor))?;
        let collision = BareCollision {
            name: descriptor.name.clone(),
            replaced_module: replaced.module.clone(),
            module: descriptor.module.clone(),
        };
        self.collisions.push(collision.clone());
        Some(collision)
    }

    /// Resolves an annotation written in `module` to a model.
    ///
    /// Only the last dotted component of the annotation text is matched. The
    /// qualified `(module, name)` key is tried first, then the bare name.
    #[must_use]
    pub fn resolve(&self, module: &str, annotation_text: &str) -> Option<&ModelDescriptor> {
        if annotation_text.is_empty() {
            return None;
        }
        let name = annotation_text
            .rsplit('.')
            .next()
            .unwrap_or(annotation_text);

        self.qualified
            .get(module)
            .and_then(|by_name| by_name.get(name))
            .or_else(|| self.bare.get(name))
            .map(AsRef::as_ref)
    }

    /// Looks up a model by its qualified key only.
    #[must_use]
    pub fn get_qualified(&self, module: &str, name: &str) -> Option<&ModelDescriptor> {
        self.qualified
            .get(module)
            .and_then(|by_name| by_name.get(name))
            .map(AsRef::as_ref)
    }

    /// Bare-name replacements seen so far, in registration order.
    #[inline]
    #[must_use]
    pub fn collisions(&self) -> &[BareCollision] {
        &self.collisions
    }

    /// Number of distinct `(module, name)` entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no models are registered.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
