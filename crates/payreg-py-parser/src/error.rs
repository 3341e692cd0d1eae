//! Error types for the payreg-py-parser crate.
//!
//! This module provides the [`ParseError`] type for errors that can occur
//! while parsing Python source and extracting definitions.

/// Errors that can occur during Python parsing.
///
/// # Examples
///
/// ```
/// use payreg_py_parser::ParseError;
///
/// fn handle_error(err: ParseError) {
///     match err {
///         ParseError::LanguageInit => eprintln!("Failed to set Python language"),
///         ParseError::QueryCompile { offset, .. } => {
///             eprintln!("Query compilation failed at offset {offset}");
///         }
///         ParseError::Parse => eprintln!("Failed to parse source code"),
///         ParseError::Syntax { line, column } => {
///             eprintln!("Syntax error at {line}:{column}");
///         }
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to set the Python language on the parser.
    #[error("failed to set Python language")]
    LanguageInit,

    /// Failed to compile a tree-sitter query.
    #[error("failed to compile query at offset {offset}: {kind:?}")]
    QueryCompile {
        /// The byte offset in the query string where the error occurred.
        offset: usize,
        /// The kind of query error.
        kind: tree_sitter::QueryError,
    },

    /// The parser produced no tree (cancelled or out of memory).
    #[error("failed to parse source code")]
    Parse,

    /// The source contains a syntax error; the file is not analysed.
    ///
    /// Positions are 1-based.
    #[error("syntax error at line {line}, column {column}")]
    Syntax {
        /// Line of the first error node.
        line: usize,
        /// Column of the first error node.
        column: usize,
    },
}
