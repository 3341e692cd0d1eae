//! Function definition extraction and route decorator matching.

use smallvec::SmallVec;
use tree_sitter::Node;

use crate::class::decorator_nodes;
use crate::literal::string_literal;
use crate::node_text;

/// A decorator of the form `<expr>.<attribute>(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorCall {
    /// Called attribute name as written, e.g. `post` in `@router.post(...)`.
    pub attribute: String,

    /// Literal path argument.
    ///
    /// The first positional argument when it is a plain string literal,
    /// replaced by a `path=` or `route=` keyword literal when present.
    pub path: Option<String>,
}

/// One handler parameter as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    /// Parameter name.
    pub name: String,

    /// Annotation source text, empty when absent.
    pub annotation: String,
}

/// A function definition carrying at least one attribute-call decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,

    /// Whether the function was declared `async def`.
    pub is_async: bool,

    /// Positional-or-keyword parameters, in order.
    ///
    /// Positional-only parameters (before `/`), `*args`, keyword-only
    /// parameters, and `**kwargs` are not included.
    pub parameters: SmallVec<[ParamDef; 4]>,

    /// Attribute-call decorators, top to bottom.
    pub decorators: SmallVec<[DecoratorCall; 2]>,

    /// 1-based line of the `def` keyword.
    pub line: usize,
}

impl FunctionDef {
    /// Yields `(METHOD, path)` for each decorator that declares a route.
    ///
    /// A decorator declares a route when its attribute matches one of
    /// `methods`, ignoring ASCII case, and it carries a non-empty literal path. Each matching
    /// decorator yields its own entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use payreg_py_parser::PyParser;
    ///
    /// let mut parser = PyParser::new()?;
    /// let module = parser.parse("@app.post('/notes')\ndef create(payload: Note):\n    ...\n")?;
    /// let methods = vec!["post".to_owned()];
    /// let routes: Vec<_> = module.functions[0].routes(&methods).collect();
    /// assert_eq!(routes, vec![("POST".to_owned(), "/notes")]);
    /// # Ok::<(), payreg_py_parser::ParseError>(())
    /// ```
    pub fn routes<'a>(
        &'a self,
        methods: &'a [String],
    ) -> impl Iterator<Item = (String, &'a str)> + 'a {
        self.decorators.iter().filter_map(move |dec| {
            if !methods.iter().any(|m| m.eq_ignore_ascii_case(&dec.attribute)) {
                return None;
            }
            let path = dec.path.as_deref().filter(|p| !p.is_empty())?;
            Some((dec.attribute.to_ascii_uppercase(), path))
        })
    }
}

/// Extracts a [`FunctionDef`] from a `function_definition` node.
///
/// Returns `None` for functions without any attribute-call decorator.
pub(crate) fn extract_function(node: Node<'_>, source: &[u8]) -> Option<FunctionDef> {
    let decorators: SmallVec<[DecoratorCall; 2]> = decorator_nodes(node)
        .into_iter()
        .filter_map(|dec| decorator_call(dec, source))
        .collect();
    if decorators.is_empty() {
        return None;
    }

    let name = node_text(node.child_by_field_name("name")?, source)?.to_owned();
    let is_async = node.child(0).is_some_and(|c| c.kind() == "async");
    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| collect_parameters(params, source))
        .unwrap_or_default();

    Some(FunctionDef {
        name,
        is_async,
        parameters,
        decorators,
        line: node.start_position().row + 1,
    })
}

fn decorator_call(decorator: Node<'_>, source: &[u8]) -> Option<DecoratorCall> {
    let call = decorator.named_child(0).filter(|n| n.kind() == "call")?;
    let function = call
        .child_by_field_name("function")
        .filter(|n| n.kind() == "attribute")?;
    let attribute = node_text(function.child_by_field_name("attribute")?, source)?.to_owned();

    let mut path = None;
    if let Some(arguments) = call
        .child_by_field_name("arguments")
        .filter(|n| n.kind() == "argument_list")
    {
        let mut cursor = arguments.walk();
        let mut first_positional = true;
        for arg in arguments.named_children(&mut cursor) {
            match arg.kind() {
                "comment" => {}
                "keyword_argument" => {
                    let key = arg
                        .child_by_field_name("name")
                        .and_then(|n| node_text(n, source));
                    if matches!(key, Some("path" | "route")) {
                        if let Some(value) = arg
                            .child_by_field_name("value")
                            .and_then(|v| string_literal(v, source))
                        {
                            path = Some(value);
                        }
                    }
                }
                "dictionary_splat" => {}
                _ => {
                    if first_positional {
                        first_positional = false;
                        if let Some(value) = string_literal(arg, source) {
                            path = Some(value);
                        }
                    }
                }
            }
        }
    }

    Some(DecoratorCall { attribute, path })
}

fn collect_parameters(params: Node<'_>, source: &[u8]) -> SmallVec<[ParamDef; 4]> {
    let mut found = SmallVec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let (name, annotation) = match param.kind() {
            "identifier" => (Some(param), None),
            "typed_parameter" => {
                let target = param.named_child(0);
                if target.is_none_or(|t| t.kind() != "identifier") {
                    break;
                }
                (target, param.child_by_field_name("type"))
            }
            "default_parameter" | "typed_default_parameter" => (
                param.child_by_field_name("name"),
                param.child_by_field_name("type"),
            ),
            "positional_separator" => {
                found.clear();
                continue;
            }
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => continue,
        };

        let Some(name) = name
            .filter(|n| n.kind() == "identifier")
            .and_then(|n| node_text(n, source))
        else {
            continue;
        };
        let annotation = annotation
            .and_then(|a| node_text(a, source))
            .unwrap_or_default();
        found.push(ParamDef {
            name: name.to_owned(),
            annotation: annotation.to_owned(),
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PyParser;

    fn functions(source: &str) -> Vec<FunctionDef> {
        let mut parser = PyParser::new().unwrap();
        parser.parse(source).unwrap().functions.into_vec()
    }

    fn methods() -> Vec<String> {
        ["get", "post", "put", "patch", "delete"]
            .map(str::to_owned)
            .to_vec()
    }

    fn param_names(function: &FunctionDef) -> Vec<&str> {
        function.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_positional_path() {
        let source = "\
@router.get(\"/notes/{note_id}\", response_model=Note)
async def read_note(note_id: int):
    ...
";
        let function = &functions(source)[0];
        assert!(function.is_async);
        let methods = methods();
        let routes: Vec<_> = function.routes(&methods).collect();
        assert_eq!(routes, vec![("GET".to_owned(), "/notes/{note_id}")]);
    }

    #[test]
    fn test_keyword_path_overrides_positional() {
        let source = "\
@app.put('/ignored', path='/items')
def update(item: Item):
    ...

@app.delete(route='/items/{id}')
def remove(id: int):
    ...
";
        let found = functions(source);
        let routes: Vec<_> = found
            .iter()
            .flat_map(|f| f.routes(&methods()).map(|(m, p)| format!("{m} {p}")).collect::<Vec<_>>())
            .collect();
        assert_eq!(routes, vec!["PUT /items", "DELETE /items/{id}"]);
    }

    #[test]
    fn test_non_literal_or_empty_path_is_excluded() {
        let source = "\
@app.get(PREFIX + '/x')
def a():
    ...

@app.get(f'/items/{version}')
def b():
    ...

@app.post('')
def c():
    ...

@app.get
def d():
    ...
";
        let found = functions(source);
        assert!(found.iter().all(|f| f.routes(&methods()).next().is_none()));
    }

    #[test]
    fn test_unrecognized_method_and_plain_decorators() {
        let source = "\
@app.websocket('/ws')
def ws():
    ...

@cache
def helper(x):
    ...

@app.GET('/upper')
def upper():
    ...
";
        let found = functions(source);
        // `@cache` is not an attribute call and is not recorded at all.
        assert_eq!(found.len(), 2);
        assert!(found[0].routes(&methods()).next().is_none());
        let methods = methods();
        let routes: Vec<_> = found[1].routes(&methods).collect();
        assert_eq!(routes, vec![("GET".to_owned(), "/upper")]);
    }

    #[test]
    fn test_configured_methods_match_in_any_case() {
        let source = "\
@router.post('/notes')
def create():
    ...
";
        let upper = vec!["GET".to_owned(), "POST".to_owned()];
        let found = functions(source);
        let routes: Vec<_> = found[0].routes(&upper).collect();
        assert_eq!(routes, vec![("POST".to_owned(), "/notes")]);
    }

    #[test]
    fn test_multiple_route_decorators() {
        let source = "\
@app.get('/a')
@app.post('/b')
def both():
    ...
";
        let function = &functions(source)[0];
        let methods = methods();
        let routes: Vec<_> = function.routes(&methods).collect();
        assert_eq!(
            routes,
            vec![("GET".to_owned(), "/a"), ("POST".to_owned(), "/b")]
        );
    }

    #[test]
    fn test_parameter_kinds() {
        let source = "\
@app.post('/p')
def handler(pos, /, self, a: int, b=1, c: 'Note' = None, *args, kw: str, **extra):
    ...
";
        let function = &functions(source)[0];
        assert_eq!(param_names(function), vec!["self", "a", "b", "c"]);
        assert_eq!(function.parameters[1].annotation, "int");
        assert_eq!(function.parameters[2].annotation, "");
        assert_eq!(function.parameters[3].annotation, "'Note'");
    }

    #[test]
    fn test_keyword_only_marker_stops_collection() {
        let source = "\
@app.get('/k')
def handler(a: schemas.Note, *, limit: int = 10):
    ...
";
        let function = &functions(source)[0];
        assert_eq!(param_names(function), vec!["a"]);
        assert_eq!(function.parameters[0].annotation, "schemas.Note");
    }

    #[test]
    fn test_methods_are_included() {
        let source = "\
class Views:
    @router.patch('/v')
    def patch(self, body: Patch):
        ...
";
        let function = &functions(source)[0];
        assert_eq!(function.name, "patch");
        assert_eq!(function.line, 3);
        assert_eq!(param_names(function), vec!["self", "body"]);
    }
}
