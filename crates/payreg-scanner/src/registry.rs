//! Model registry construction from analysed source files.
//!
//! [`RegistryBuilder`] classifies every extracted class and registers the
//! models into a fresh [`ModelRegistry`]. The registry is scoped to one run
//! and passed explicitly to the shape builder.

use payreg_core::{ModelDescriptor, ModelRegistry, ScanConfig};
use tracing::{debug, info, warn};

use crate::analyzer::SourceFile;

/// Builder for constructing a [`ModelRegistry`] from analysed files.
///
/// Files are registered in the order given; with files sorted by path the
/// bare-name winner of a collision is reproducible across runs.
///
/// # Examples
///
/// ```
/// use payreg_core::ScanConfig;
/// use payreg_scanner::RegistryBuilder;
///
/// let builder = RegistryBuilder::from_config(&ScanConfig::default());
/// let registry = builder.build(&[]);
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    schema_bases: Vec<String>,
    dataclass_markers: Vec<String>,
}

impl RegistryBuilder {
    /// Creates a builder with explicit classification rules.
    #[must_use]
    pub fn new(schema_bases: Vec<String>, dataclass_markers: Vec<String>) -> Self {
        Self {
            schema_bases,
            dataclass_markers,
        }
    }

    /// Creates a builder using the configured schema bases and markers.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.schema_bases.clone(), config.dataclass_markers.clone())
    }

    /// Classifies and registers every model class in `files`.
    ///
    /// Bare-name collisions keep the later model and are logged as warnings.
    #[must_use]
    pub fn build(&self, files: &[SourceFile]) -> ModelRegistry {
        let mut registry = ModelRegistry::new();

        for file in files {
            for class in &file.parsed.classes {
                let Some(kind) = class.classify(&self.schema_bases, &self.dataclass_markers) else {
                    continue;
                };
                debug!(
                    module = %file.module,
                    name = %class.name,
                    kind = kind.label(),
                    fields = class.fields.len(),
                    "Registered model"
                );
                let collision = registry.register(ModelDescriptor {
                    name: class.name.clone(),
                    module: file.module.clone(),
                    fields: class.fields.clone(),
                    kind,
                });
                if let Some(collision) = collision {
                    warn!(
                        name = %collision.name,
                        replaced = %collision.replaced_module,
                        winner = %collision.module,
                        "Model name defined in several modules; bare-name lookups now use the later one"
                    );
                }
            }
        }

        info!(
            models = registry.len(),
            collisions = registry.collisions().len(),
            "Built model registry"
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payreg_core::ModelKind;
    use payreg_py_parser::PyParser;

    fn source_file(module: &str, source: &str) -> SourceFile {
        let mut parser = PyParser::new().unwrap();
        SourceFile {
            path: format!("{}.py", module.replace('.', "/")).into(),
            module: module.to_owned(),
            parsed: parser.parse(source).unwrap(),
        }
    }

    #[test]
    fn test_build_classifies_models() {
        let files = vec![source_file(
            "app.models",
            "\
class Note(BaseModel):
    title: str

class Plain:
    x = 1

class Empty:
    pass
",
        )];
        let registry = RegistryBuilder::from_config(&ScanConfig::default()).build(&files);

        assert_eq!(registry.len(), 2);
        let note = registry.get_qualified("app.models", "Note").unwrap();
        assert_eq!(note.kind, ModelKind::Schema);
        let plain = registry.get_qualified("app.models", "Plain").unwrap();
        assert_eq!(plain.kind, ModelKind::Plain);
        assert!(registry.get_qualified("app.models", "Empty").is_none());
    }

    #[test]
    fn test_later_file_wins_bare_lookup() {
        let files = vec![
            source_file("a.schemas", "class User(BaseModel):\n    id: int\n"),
            source_file("b.schemas", "class User(BaseModel):\n    email: str\n"),
        ];
        let registry = RegistryBuilder::from_config(&ScanConfig::default()).build(&files);

        let resolved = registry.resolve("c.routes", "User").unwrap();
        assert_eq!(resolved.module, "b.schemas");
        assert_eq!(registry.collisions().len(), 1);
    }
}
