//! In-process store, used for tests and dry runs.
//!
//! Tables must be created before they are written to, mirroring a real store
//! where writes to a missing relation fail with a 404. Failures can be
//! injected per procedure or per table.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use payreg_core::FxHashSet;
use serde_json::{Value, json};

use crate::error::StoreError;
use crate::store::{StoreClient, StoreFuture, StoreResponse, TableRef};

#[derive(Debug, Default)]
struct State {
    procedures: BTreeMap<String, Value>,
    tables: BTreeMap<String, Vec<Value>>,
    failing_procedures: FxHashSet<String>,
    failing_selects: FxHashSet<String>,
    rejected_writes: FxHashSet<String>,
}

/// A store holding every table in memory.
///
/// # Examples
///
/// ```
/// use payreg_sync::{MemoryStore, TableRef};
/// use serde_json::json;
///
/// let store = MemoryStore::new()
///     .with_procedure("list_public_tables", json!(["notes"]))
///     .with_table("kitenga.payload_registry", Vec::new());
/// assert!(store.rows(&TableRef::parse("kitenga.payload_registry")).is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the result of a named procedure.
    #[must_use]
    pub fn with_procedure(self, name: &str, result: Value) -> Self {
        self.state.lock().procedures.insert(name.to_owned(), result);
        self
    }

    /// Creates `table` (as `schema.table` or a bare name) holding `rows`.
    #[must_use]
    pub fn with_table(self, table: &str, rows: Vec<Value>) -> Self {
        self.state.lock().tables.insert(table.to_owned(), rows);
        self
    }

    /// Makes every call to `name` fail as unreachable.
    #[must_use]
    pub fn failing_procedure(self, name: &str) -> Self {
        self.state.lock().failing_procedures.insert(name.to_owned());
        self
    }

    /// Makes every select on `table` fail as unreachable.
    #[must_use]
    pub fn failing_select(self, table: &str) -> Self {
        self.state.lock().failing_selects.insert(table.to_owned());
        self
    }

    /// Makes every write to `table` answer with status 500.
    ///
    /// For upserts, `table` may also be `table:key` to reject only the row
    /// whose conflict column holds `key`.
    #[must_use]
    pub fn rejecting_writes(self, table: &str) -> Self {
        self.state.lock().rejected_writes.insert(table.to_owned());
        self
    }

    /// A copy of the rows currently in `table`.
    #[must_use]
    pub fn rows(&self, table: &TableRef) -> Vec<Value> {
        self.state
            .lock()
            .tables
            .get(&table.to_string())
            .cloned()
            .unwrap_or_default()
    }

    fn missing_relation(table: &TableRef) -> StoreResponse {
        StoreResponse::new(
            404,
            json!({"code": "42P01", "message": format!("relation \"{table}\" does not exist")}),
        )
    }

    fn rejected(table: &TableRef) -> StoreResponse {
        StoreResponse::new(500, json!({"message": format!("write to {table} rejected")}))
    }

    fn call_rpc(&self, function: &str) -> Result<StoreResponse, StoreError> {
        let state = self.state.lock();
        if state.failing_procedures.contains(function) {
            return Err(StoreError::unavailable(format!("procedure {function} failed")));
        }
        Ok(match state.procedures.get(function) {
            Some(result) => StoreResponse::new(200, result.clone()),
            None => StoreResponse::new(
                404,
                json!({"message": format!("function {function} does not exist")}),
            ),
        })
    }

    fn call_select(&self, table: &TableRef, limit: usize) -> Result<StoreResponse, StoreError> {
        let key = table.to_string();
        let state = self.state.lock();
        if state.failing_selects.contains(&key) {
            return Err(StoreError::unavailable(format!("select on {key} failed")));
        }
        Ok(match state.tables.get(&key) {
            Some(rows) => {
                StoreResponse::new(200, rows.iter().take(limit).cloned().collect())
            }
            None => Self::missing_relation(table),
        })
    }

    fn call_upsert(&self, table: &TableRef, row: &Value, on_conflict: &str) -> StoreResponse {
        let key = table.to_string();
        let conflict_value = row.get(on_conflict).cloned().unwrap_or(Value::Null);
        let mut state = self.state.lock();

        let row_key = format!("{key}:{}", conflict_value.as_str().unwrap_or_default());
        if state.rejected_writes.contains(&key) || state.rejected_writes.contains(&row_key) {
            return Self::rejected(table);
        }
        let Some(rows) = state.tables.get_mut(&key) else {
            return Self::missing_relation(table);
        };

        match rows
            .iter_mut()
            .find(|existing| existing.get(on_conflict) == Some(&conflict_value))
        {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        StoreResponse::new(201, Value::Array(vec![row.clone()]))
    }

    fn call_insert(&self, table: &TableRef, row: &Value) -> StoreResponse {
        let key = table.to_string();
        let mut state = self.state.lock();
        if state.rejected_writes.contains(&key) {
            return Self::rejected(table);
        }
        match state.tables.get_mut(&key) {
            Some(rows) => {
                rows.push(row.clone());
                StoreResponse::new(201, Value::Null)
            }
            None => Self::missing_relation(table),
        }
    }
}

impl StoreClient for MemoryStore {
    fn rpc<'a>(&'a self, function: &'a str) -> StoreFuture<'a> {
        let result = self.call_rpc(function);
        Box::pin(async move { result })
    }

    fn select<'a>(
        &'a self,
        table: &'a TableRef,
        _columns: &'a str,
        limit: usize,
    ) -> StoreFuture<'a> {
        let result = self.call_select(table, limit);
        Box::pin(async move { result })
    }

    fn upsert<'a>(
        &'a self,
        table: &'a TableRef,
        row: &'a Value,
        on_conflict: &'a str,
    ) -> StoreFuture<'a> {
        let response = self.call_upsert(table, row, on_conflict);
        Box::pin(async move { Ok(response) })
    }

    fn insert<'a>(&'a self, table: &'a TableRef, row: &'a Value) -> StoreFuture<'a> {
        let response = self.call_insert(table, row);
        Box::pin(async move { Ok(response) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_replaces_on_conflict_key() {
        let store = MemoryStore::new().with_table("kitenga.docs", Vec::new());
        let table = TableRef::parse("kitenga.docs");

        let first = json!({"name": "a", "v": 1});
        let second = json!({"name": "a", "v": 2});
        assert!(store.upsert(&table, &first, "name").await.unwrap().is_success());
        assert!(store.upsert(&table, &second, "name").await.unwrap().is_success());

        assert_eq!(store.rows(&table), vec![second]);
    }

    #[tokio::test]
    async fn test_missing_table_is_404() {
        let store = MemoryStore::new();
        let table = TableRef::parse("public.nope");
        let response = store.select(&table, "*", 1).await.unwrap();
        assert_eq!(response.status, 404);
        let response = store.insert(&table, &json!({})).await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new()
            .with_procedure("list_tables_ext", json!(["x"]))
            .failing_procedure("list_tables_ext")
            .with_table("public.t", vec![json!({"id": 1})])
            .failing_select("public.t")
            .rejecting_writes("public.t:b");
        let table = TableRef::parse("public.t");

        assert!(store.rpc("list_tables_ext").await.is_err());
        assert!(store.select(&table, "*", 1).await.is_err());

        let ok = store.upsert(&table, &json!({"id": "a"}), "id").await.unwrap();
        assert!(ok.is_success());
        let rejected = store.upsert(&table, &json!({"id": "b"}), "id").await.unwrap();
        assert_eq!(rejected.status, 500);
    }
}
