//! Payload shape construction.
//!
//! For every route decorator found on a function, [`ShapeBuilder`] produces a
//! [`PayloadShape`]: the handler's parameters, each resolved against the
//! [`ModelRegistry`] where possible and given an example payload.

use payreg_core::{FxHashSet, ModelRegistry, PayloadShape, RegisteredRoute, RouteParameter};
use payreg_py_parser::{FunctionDef, ParamDef};
use serde_json::{Map, Value};

use crate::analyzer::SourceFile;
use crate::examples::ExampleStrategy;

/// Parameters never treated as payload.
const RECEIVER_NAMES: [&str; 2] = ["self", "cls"];

/// Upper bound of every shape score.
pub const MAX_SHAPE_SCORE: u8 = 10;

/// `min(10, 1 + parameter_count)`.
///
/// # Examples
///
/// ```
/// use payreg_scanner::shape_score;
///
/// assert_eq!(shape_score(0), 1);
/// assert_eq!(shape_score(3), 4);
/// assert_eq!(shape_score(42), 10);
/// ```
#[must_use]
pub fn shape_score(parameter_count: usize) -> u8 {
    u8::try_from(parameter_count.saturating_add(1))
        .unwrap_or(MAX_SHAPE_SCORE)
        .min(MAX_SHAPE_SCORE)
}

/// Builds payload shapes from analysed files.
pub struct ShapeBuilder<'a> {
    registry: &'a ModelRegistry,
    strategy: &'a dyn ExampleStrategy,
    route_methods: &'a [String],
    registered: FxHashSet<(String, String)>,
}

impl<'a> ShapeBuilder<'a> {
    /// Creates a builder resolving against `registry`.
    ///
    /// `route_methods` are the decorator attribute names that mark a route
    /// handler, matched ignoring case.
    #[must_use]
    pub fn new(
        registry: &'a ModelRegistry,
        strategy: &'a dyn ExampleStrategy,
        route_methods: &'a [String],
    ) -> Self {
        Self {
            registry,
            strategy,
            route_methods,
            registered: FxHashSet::default(),
        }
    }

    /// Sets the independently collected route list used for `registered`.
    ///
    /// Methods are compared case-insensitively, paths exactly.
    #[must_use]
    pub fn with_registered_routes(mut self, routes: &[RegisteredRoute]) -> Self {
        self.registered = routes
            .iter()
            .map(|r| (r.method.to_uppercase(), r.path.clone()))
            .collect();
        self
    }

    /// Builds one shape per route decorator, in file then source order.
    #[must_use]
    pub fn build(&self, files: &[SourceFile]) -> Vec<PayloadShape> {
        let mut shapes = Vec::new();
        for file in files {
            for function in &file.parsed.functions {
                for (method, path) in function.routes(self.route_methods) {
                    shapes.push(self.shape_for(file, function, method, path));
                }
            }
        }
        shapes
    }

    fn shape_for(
        &self,
        file: &SourceFile,
        function: &FunctionDef,
        method: String,
        path: &str,
    ) -> PayloadShape {
        let parameters: Vec<RouteParameter> = function
            .parameters
            .iter()
            .filter(|p| !RECEIVER_NAMES.contains(&p.name.as_str()))
            .map(|p| self.resolve_parameter(&file.module, p))
            .collect();

        let examples: Map<String, Value> = parameters
            .iter()
            .filter_map(|p| {
                let example = p.example_payload.as_ref().filter(|e| !e.is_empty())?;
                Some((p.name.clone(), Value::Object(example.clone())))
            })
            .collect();

        let registered = self.registered.contains(&(method.clone(), path.to_owned()));

        PayloadShape {
            path: path.to_owned(),
            method,
            function: function.name.clone(),
            module: file.module.clone(),
            source_path: file.path.clone(),
            shape_score: shape_score(parameters.len()),
            parameters,
            registered,
            example_payload: (!examples.is_empty()).then_some(examples),
        }
    }

    fn resolve_parameter(&self, module: &str, param: &ParamDef) -> RouteParameter {
        let mut resolved = RouteParameter::new(param.name.clone(), param.annotation.clone());
        if let Some(model) = self.registry.resolve(module, &param.annotation) {
            resolved.model = Some(model.name.clone());
            resolved.example_payload = Some(self.strategy.example_payload(&model.fields));
            resolved.model_fields = Some(model.fields.clone());
        }
        resolved
    }
}

impl std::fmt::Debug for ShapeBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeBuilder")
            .field("models", &self.registry.len())
            .field("route_methods", &self.route_methods)
            .field("registered", &self.registered.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::examples::HeuristicExamples;
    use crate::registry::RegistryBuilder;
    use payreg_core::ScanConfig;
    use payreg_py_parser::PyParser;
    use serde_json::json;

    fn file(module: &str, source: &str) -> SourceFile {
        SourceFile {
            path: format!("{}.py", module.replace('.', "/")).into(),
            module: module.to_owned(),
            parsed: PyParser::new().unwrap().parse(source).unwrap(),
        }
    }

    fn build(files: &[SourceFile], routes: &[RegisteredRoute]) -> Vec<PayloadShape> {
        let config = ScanConfig::default();
        let registry = RegistryBuilder::from_config(&config).build(files);
        ShapeBuilder::new(&registry, &HeuristicExamples, &config.route_methods)
            .with_registered_routes(routes)
            .build(files)
    }

    #[test]
    fn test_note_scenario() {
        let files = vec![file(
            "app.main",
            "\
class Note(BaseModel):
    title: str
    count: int

@app.post(\"/notes\")
def create_note(payload: Note):
    ...
",
        )];
        let shapes = build(&files, &[]);
        assert_eq!(shapes.len(), 1);
        let shape = &shapes[0];
        assert_eq!(shape.method, "POST");
        assert_eq!(shape.path, "/notes");
        assert_eq!(shape.shape_score, 2);
        assert!(!shape.registered);

        let param = &shape.parameters[0];
        assert_eq!(param.model.as_deref(), Some("Note"));
        assert_eq!(
            Value::Object(param.example_payload.clone().unwrap()),
            json!({"title": "example_title", "count": 0})
        );
        assert_eq!(
            Value::Object(shape.example_payload.clone().unwrap()),
            json!({"payload": {"title": "example_title", "count": 0}})
        );
    }

    #[test]
    fn test_unresolved_and_receiver_parameters() {
        let files = vec![file(
            "app.views",
            "\
class Views:
    @router.get('/items/{item_id}')
    def read(self, item_id: int, q: Optional[Query] = None, request=None):
        ...
",
        )];
        let shape = &build(&files, &[])[0];
        let names: Vec<_> = shape.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["item_id", "q", "request"]);
        assert!(shape.parameters.iter().all(|p| p.model.is_none()));
        assert!(shape.example_payload.is_none());
        assert_eq!(shape.shape_score, 4);
    }

    #[test]
    fn test_empty_model_attaches_empty_example_only_on_parameter() {
        let files = vec![file(
            "app.main",
            "\
@dataclass
class Marker:
    pass

@app.delete('/m')
def remove(body: Marker):
    ...
",
        )];
        let shape = &build(&files, &[])[0];
        assert_eq!(shape.parameters[0].example_payload, Some(Map::new()));
        assert!(shape.example_payload.is_none());
    }

    #[test]
    fn test_registered_flag_and_registration_alone() {
        let files = vec![file("app.main", "@app.get('/health')\nasync def health():\n    ...\n")];
        let routes = vec![
            RegisteredRoute {
                file: "app/main.py".to_owned(),
                method: "get".to_owned(),
                path: "/health".to_owned(),
            },
            RegisteredRoute {
                file: "app/other.py".to_owned(),
                method: "GET".to_owned(),
                path: "/only-registered".to_owned(),
            },
        ];
        let shapes = build(&files, &routes);
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].registered);
        assert!(shapes.iter().all(|s| s.path != "/only-registered"));
    }

    #[test]
    fn test_qualified_annotation_resolves_by_last_component() {
        let files = vec![
            file("app.schemas", "class User(BaseModel):\n    id: int\n"),
            file(
                "app.routes",
                "@app.put('/users')\ndef update(user: schemas.User):\n    ...\n",
            ),
        ];
        let shape = &build(&files, &[])[0];
        assert_eq!(shape.parameters[0].model.as_deref(), Some("User"));
        assert_eq!(shape.source_path, "app/routes.py");
    }
}
