//! Python parser using tree-sitter for schema model and route handler extraction.
//!
//! This crate parses Python source without importing or executing it and
//! extracts two kinds of definitions:
//!
//! - Class definitions, with literal base names, decorator names, and
//!   class-level fields ([`ClassDef`])
//! - Decorated function definitions, with their parameters and any
//!   `<expr>.<method>("/path")` decorators ([`FunctionDef`])
//!
//! # Overview
//!
//! ```
//! use payreg_core::ModelKind;
//! use payreg_py_parser::PyParser;
//!
//! let mut parser = PyParser::new()?;
//! let source = r#"
//! from pydantic import BaseModel
//!
//! class Note(BaseModel):
//!     title: str
//!     count: int
//!
//! @router.post("/notes")
//! async def create_note(payload: Note):
//!     ...
//! "#;
//!
//! let module = parser.parse(source)?;
//!
//! let schema_bases = vec!["BaseModel".to_owned()];
//! assert_eq!(module.classes[0].classify(&schema_bases, &[]), Some(ModelKind::Schema));
//!
//! let methods = vec!["post".to_owned()];
//! let routes: Vec<_> = module.functions[0].routes(&methods).collect();
//! assert_eq!(routes, vec![("POST".to_owned(), "/notes")]);
//! # Ok::<(), payreg_py_parser::ParseError>(())
//! ```
//!
//! # Precision
//!
//! Annotations, bases, and defaults are captured as the exact source text.
//! Nothing is resolved through imports, so `from pydantic import BaseModel as M`
//! followed by `class X(M)` is not recognised as a schema base.
//!
//! # Thread Safety
//!
//! [`PyParser`] is `Send` but not `Sync`. The underlying tree-sitter query is
//! thread-safe and shared globally.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod class;
pub mod error;
mod literal;
mod parser;
pub mod queries;
mod route;

use tree_sitter::Node;

pub use class::ClassDef;
pub use error::ParseError;
pub use parser::{ParsedModule, PyParser};
pub use route::{DecoratorCall, FunctionDef, ParamDef};

/// Source text of a node, `None` if it is not valid UTF-8.
#[inline]
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    node.utf8_text(source).ok()
}
