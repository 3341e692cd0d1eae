//! Pre-compiled tree-sitter queries for Python definition extraction.
//!
//! This module provides the [`DEFINITION_QUERY`] constant and
//! [`get_definition_query`] for lazily compiling and caching it.

use std::sync::OnceLock;

use tree_sitter::{Language, Query};

use crate::error::ParseError;

/// Tree-sitter query matching every class and function definition.
///
/// Nested definitions (methods, inner functions, inner classes) match too.
///
/// # Capture Names
///
/// - `class` - A `class_definition` node
/// - `function` - A `function_definition` node, sync or async
pub const DEFINITION_QUERY: &str = r"
(class_definition) @class

(function_definition) @function
";

/// Capture index for `class`.
pub const CAPTURE_CLASS: u32 = 0;

/// Capture index for `function`.
pub const CAPTURE_FUNCTION: u32 = 1;

/// Global cache for the compiled definition query.
static COMPILED_QUERY: OnceLock<Query> = OnceLock::new();

/// Returns the compiled definition query.
///
/// The query is compiled once and cached for all subsequent calls.
/// This function is thread-safe.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the query fails to compile.
pub fn get_definition_query() -> Result<&'static Query, ParseError> {
    if let Some(query) = COMPILED_QUERY.get() {
        return Ok(query);
    }

    let language: Language = tree_sitter_python::LANGUAGE.into();
    let query = compile_query(&language)?;

    Ok(COMPILED_QUERY.get_or_init(|| query))
}

fn compile_query(language: &Language) -> Result<Query, ParseError> {
    Query::new(language, DEFINITION_QUERY).map_err(|e| ParseError::QueryCompile {
        offset: e.offset,
        kind: e,
    })
}
