//! The store capability used by the sync coordinator.
//!
//! [`StoreClient`] is the whole surface the coordinator relies on: named
//! procedure calls for table discovery plus select, upsert, and insert on a
//! schema-qualified table. Any backend satisfying it can be synced into.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::StoreError;

/// Boxed future returned by [`StoreClient`] methods, keeping the trait
/// dyn-compatible.
pub type StoreFuture<'a> =
    Pin<Box<dyn Future<Output = Result<StoreResponse, StoreError>> + Send + 'a>>;

/// Schema used when a table name carries none.
pub const DEFAULT_SCHEMA: &str = "public";

/// A possibly schema-qualified table.
///
/// # Examples
///
/// ```
/// use payreg_sync::TableRef;
///
/// let table = TableRef::parse("kitenga.payload_registry");
/// assert_eq!(table.schema.as_deref(), Some("kitenga"));
/// assert_eq!(table.name, "payload_registry");
/// assert_eq!(TableRef::parse("notes").schema_or_default(), "public");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Schema, if one was given.
    pub schema: Option<String>,
    /// Bare table name.
    pub name: String,
}

impl TableRef {
    /// A table inside `schema`.
    #[must_use]
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Splits `schema.table` on the first dot; a bare name has no schema.
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self {
                schema: None,
                name: qualified.to_owned(),
            },
        }
    }

    /// The schema, or [`DEFAULT_SCHEMA`].
    #[must_use]
    pub fn schema_or_default(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Status and decoded body of one store call.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Decoded body; `Null` when the store returned nothing.
    pub data: Value,
}

impl StoreResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// Whether the status is below 400.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < 400
    }

    /// The body as a row list; anything else is no rows.
    #[must_use]
    pub fn rows(&self) -> &[Value] {
        self.data.as_array().map_or(&[], Vec::as_slice)
    }
}

/// Table-scoped access to the external store.
pub trait StoreClient: Send + Sync {
    /// Calls a named remote procedure without arguments.
    fn rpc<'a>(&'a self, function: &'a str) -> StoreFuture<'a>;

    /// Selects `columns` from `table`, returning at most `limit` rows.
    fn select<'a>(
        &'a self,
        table: &'a TableRef,
        columns: &'a str,
        limit: usize,
    ) -> StoreFuture<'a>;

    /// Inserts `row`, or updates the existing row whose `on_conflict` column
    /// holds the same value.
    fn upsert<'a>(
        &'a self,
        table: &'a TableRef,
        row: &'a Value,
        on_conflict: &'a str,
    ) -> StoreFuture<'a>;

    /// Appends `row`.
    fn insert<'a>(&'a self, table: &'a TableRef, row: &'a Value) -> StoreFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_ref_display_round_trips() {
        assert_eq!(TableRef::parse("public.notes").to_string(), "public.notes");
        assert_eq!(TableRef::parse("notes").to_string(), "notes");
        assert_eq!(TableRef::parse("a.b.c").name, "b.c");
    }

    #[test]
    fn test_response_rows() {
        let ok = StoreResponse::new(200, json!([{"id": 1}]));
        assert!(ok.is_success());
        assert_eq!(ok.rows().len(), 1);

        let err = StoreResponse::new(404, json!({"message": "missing"}));
        assert!(!err.is_success());
        assert!(err.rows().is_empty());
    }
}
