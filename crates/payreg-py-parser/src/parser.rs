//! Python parser management using tree-sitter.
//!
//! This module provides the [`PyParser`] struct for parsing Python files and
//! extracting class and route handler definitions.

use smallvec::SmallVec;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, QueryCursor, Tree};

use crate::class::{ClassDef, extract_class};
use crate::error::ParseError;
use crate::queries::{CAPTURE_CLASS, CAPTURE_FUNCTION, get_definition_query};
use crate::route::{FunctionDef, extract_function};

/// Definitions extracted from one Python module.
///
/// Both lists follow source order, nested definitions included.
#[derive(Debug, Default)]
pub struct ParsedModule {
    /// Every class definition.
    pub classes: SmallVec<[ClassDef; 4]>,

    /// Function definitions carrying at least one attribute-call decorator.
    pub functions: SmallVec<[FunctionDef; 8]>,
}

/// Python parser for extracting definitions from source files.
///
/// Wraps a tree-sitter parser configured for Python. The parser can be
/// reused for multiple files to avoid repeated initialization.
///
/// # Thread Safety
///
/// `PyParser` is `Send` but not `Sync`. For parallel scanning with rayon,
/// create one parser per worker with `map_init`. The compiled query is shared.
///
/// # Examples
///
/// ```
/// use payreg_py_parser::PyParser;
///
/// let mut parser = PyParser::new()?;
/// let source = r#"
/// class Note(BaseModel):
///     title: str
///
/// @app.post("/notes")
/// def create_note(payload: Note):
///     ...
/// "#;
/// let module = parser.parse(source)?;
/// assert_eq!(module.classes.len(), 1);
/// assert_eq!(module.functions[0].name, "create_note");
/// # Ok::<(), payreg_py_parser::ParseError>(())
/// ```
pub struct PyParser {
    parser: Parser,
}

impl PyParser {
    /// Creates a new Python parser.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the Python grammar cannot be
    /// loaded into the parser.
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_python::LANGUAGE.into();

        parser
            .set_language(&language)
            .map_err(|_| ParseError::LanguageInit)?;

        Ok(Self { parser })
    }

    /// Parses Python source and extracts class and route handler definitions.
    ///
    /// Source with syntax errors is rejected as a whole rather than partially
    /// analysed.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Syntax`] if the tree contains an error or missing node
    /// - [`ParseError::Parse`] if tree-sitter returns no tree
    /// - [`ParseError::QueryCompile`] if the definition query fails to compile
    pub fn parse(&mut self, source: &str) -> Result<ParsedModule, ParseError> {
        let tree = self.parse_tree(source)?;
        let query = get_definition_query()?;
        let bytes = source.as_bytes();

        let mut module = ParsedModule::default();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, tree.root_node(), bytes);

        while let Some(match_) = matches.next() {
            for capture in match_.captures {
                match capture.index {
                    CAPTURE_CLASS => module.classes.extend(extract_class(capture.node, bytes)),
                    CAPTURE_FUNCTION => {
                        module.functions.extend(extract_function(capture.node, bytes));
                    }
                    _ => {}
                }
            }
        }

        Ok(module)
    }

    /// Parses source into a syntax tree, rejecting trees with errors.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_tree(&mut self, source: &str) -> Result<Tree, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(ParseError::Parse)?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error(root)
                .map_or((1, 1), |n| (n.start_position().row + 1, n.start_position().column + 1));
            return Err(ParseError::Syntax { line, column });
        }
        Ok(tree)
    }
}

impl std::fmt::Debug for PyParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyParser")
            .field("grammar", &"python")
            .finish_non_exhaustive()
    }
}

/// Finds the first `ERROR` or missing node in document order.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.has_error())
        .find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_new() {
        assert!(PyParser::new().is_ok());
    }

    #[test]
    fn test_parse_empty_source() {
        let mut parser = PyParser::new().expect("Parser creation failed");
        let module = parser.parse("").expect("Parse failed");
        assert!(module.classes.is_empty());
        assert!(module.functions.is_empty());
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let mut parser = PyParser::new().expect("Parser creation failed");
        let err = parser
            .parse("class Broken(:\n    x: int\n")
            .expect_err("Broken source should fail");
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_nested_definitions_in_source_order() {
        let mut parser = PyParser::new().expect("Parser creation failed");
        let source = "\
class Outer:
    class Inner(BaseModel):
        x: int

def factory(app):
    @app.get('/inner')
    def inner():
        ...
    return inner
";
        let module = parser.parse(source).expect("Parse failed");
        let names: Vec<_> = module.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Inner"]);
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "inner");
    }

    #[test]
    fn test_parse_is_repeatable() {
        let mut parser = PyParser::new().expect("Parser creation failed");
        let source = "@app.get('/a')\ndef a(q: str):\n    ...\n";
        let first = parser.parse(source).expect("Parse failed");
        let second = parser.parse(source).expect("Parse failed");
        assert_eq!(first.functions, second.functions);
    }

    /// One line per definition, member, and decorator.
    fn outline(module: &ParsedModule) -> String {
        let mut lines = Vec::new();
        for class in &module.classes {
            lines.push(format!(
                "class {} @{} bases=[{}] decorators=[{}]",
                class.name,
                class.line,
                class.bases.join(", "),
                class.decorators.join(", ")
            ));
            for field in &class.fields {
                let mut line = format!("  {}: {}", field.name, field.type_text);
                if !field.default_text.is_empty() {
                    line = format!("{line} = {}", field.default_text);
                }
                lines.push(line);
            }
        }
        for function in &module.functions {
            let kind = if function.is_async { "async def" } else { "def" };
            lines.push(format!("{kind} {} @{}", function.name, function.line));
            for param in &function.parameters {
                if param.annotation.is_empty() {
                    lines.push(format!("  param {}", param.name));
                } else {
                    lines.push(format!("  param {}: {}", param.name, param.annotation));
                }
            }
            for dec in &function.decorators {
                lines.push(format!(
                    "  route .{} {}",
                    dec.attribute,
                    dec.path.as_deref().unwrap_or("-")
                ));
            }
        }
        lines.join("\n")
    }

    #[test]
    fn test_module_outline() {
        let mut parser = PyParser::new().expect("Parser creation failed");
        let source = r#"class Note(BaseModel):
    title: str
    count: int = 0

@dataclass
class Point:
    x: float

@router.post("/notes")
@router.put(path="/notes/{id}")
async def upsert_note(payload: Note, request, *, debug: bool = False):
    ...

@app.get(prefix + "/x")
def dynamic():
    ...
"#;
        let module = parser.parse(source).expect("Parse failed");
        insta::assert_snapshot!(outline(&module), @r"
        class Note @1 bases=[BaseModel] decorators=[]
          title: str
          count: int = 0
        class Point @6 bases=[] decorators=[dataclass]
          x: float
        async def upsert_note @11
          param payload: Note
          param request
          route .post /notes
          route .put /notes/{id}
        def dynamic @15
          route .get -
        ");
    }
}
