//! Sync coordinator runs against the in-memory store.

use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use payreg_core::{Config, DriftReport, PayloadShape, Summary};
use payreg_sync::{MemoryStore, StoreClient, SyncCoordinator, SyncErrorTag, TableRef};
use serde_json::{Value, json};
use tempfile::TempDir;

const REGISTRY: &str = "kitenga.payload_registry";
const DOCUMENTS: &str = "kitenga.analysis_documents";
const EVENTS: &str = "kitenga.analysis_sync_events";

struct Fixture {
    _dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.scan.root_path = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        Self { _dir: dir, config }
    }

    fn write_artifact(&self, name: &str, contents: &str) {
        let dir = self.config.artifact_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), contents).unwrap();
    }

    fn coordinator(&self, store: &Arc<MemoryStore>) -> SyncCoordinator {
        let client: Arc<dyn StoreClient> = Arc::<MemoryStore>::clone(store);
        SyncCoordinator::new(Some(client), self.config.clone())
    }
}

fn ready_store() -> MemoryStore {
    MemoryStore::new()
        .with_procedure(
            "list_tables_ext",
            json!([
                {"schema_name": "public", "table_name": "notes"},
                {"schema_name": "public", "table_name": "users"},
                {"schema_name": "auth", "table_name": "sessions"}
            ]),
        )
        .with_table("public.notes", vec![json!({"id": 1, "title": "t", "count": 2})])
        .with_table("public.users", Vec::new())
        .with_table(REGISTRY, Vec::new())
        .with_table(DOCUMENTS, Vec::new())
        .with_table(EVENTS, Vec::new())
}

fn summary() -> Summary {
    Summary {
        timestamp: "2026-02-01T09:30:00.000000".to_owned(),
        shape_score_total: 2,
        payload_shapes: vec![
            PayloadShape {
                method: "POST".to_owned(),
                path: "/notes".to_owned(),
                function: "create_note".to_owned(),
                ..PayloadShape::default()
            },
            PayloadShape {
                method: "GET".to_owned(),
                path: "/health".to_owned(),
                function: "health".to_owned(),
                ..PayloadShape::default()
            },
        ],
        drift: DriftReport {
            added: vec!["GET /health".to_owned(), "POST /notes".to_owned()],
            ..DriftReport::default()
        },
        ..Summary::default()
    }
}

fn registry_row<'a>(rows: &'a [Value], table: &str) -> &'a Value {
    rows.iter()
        .find(|row| row["table_name"] == table)
        .unwrap()
}

#[tokio::test]
async fn test_full_sync_writes_records_documents_and_event() {
    let fx = Fixture::new();
    fx.write_artifact("payload_map.json", r#"{"timestamp": "2026-02-01T09:30:00.000000"}"#);
    fx.write_artifact("payload_map.md", "# Payload Registry\n");
    fx.write_artifact("review_log_20260201_093000_payload.md", "scan started\n");
    let store = Arc::new(ready_store());

    let outcome = fx.coordinator(&store).sync(&summary()).await;

    assert_eq!(outcome.error, None);
    assert_eq!(outcome.synced_tables, vec!["public.notes", "public.users"]);
    assert_eq!(
        outcome.document_refs,
        vec!["payload_map_json", "payload_map_md", "review_log_20260201_093000_payload"]
    );

    let registry = store.rows(&TableRef::parse(REGISTRY));
    let notes = registry_row(&registry, "public.notes");
    assert_eq!(notes["routes"], json!(["/notes"]));
    assert_eq!(notes["schema_name"], "public");
    assert_eq!(notes["policy_info"], json!([]));
    assert_eq!(
        notes["columns"],
        json!([
            {"name": "id", "type": "unknown"},
            {"name": "title", "type": "unknown"},
            {"name": "count", "type": "unknown"}
        ])
    );
    assert_eq!(notes["summary_snapshot"]["payload_shapes_count"], 2);
    assert_eq!(notes["document_refs"].as_array().unwrap().len(), 3);

    let users = registry_row(&registry, "public.users");
    assert_eq!(users["columns"], json!([]));
    assert_eq!(users["routes"], json!([]));

    let events = store.rows(&TableRef::parse(EVENTS));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["run_id"], "2026-02-01T09:30:00.000000");
    assert_eq!(events[0]["event_type"], "repo_review");
    assert_eq!(events[0]["payload_count"], 2);
    assert_eq!(events[0]["synced_tables"], json!(["public.notes", "public.users"]));
}

#[tokio::test]
async fn test_repeated_sync_keeps_one_row_per_key() {
    let fx = Fixture::new();
    fx.write_artifact("payload_map.md", "# Payload Registry\n");
    let store = Arc::new(ready_store());
    let coordinator = fx.coordinator(&store);

    coordinator.sync(&summary()).await;
    let first = store.rows(&TableRef::parse(REGISTRY));
    coordinator.sync(&summary()).await;
    let second = store.rows(&TableRef::parse(REGISTRY));

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(store.rows(&TableRef::parse(DOCUMENTS)).len(), 1);
    // The event log is append-only.
    assert_eq!(store.rows(&TableRef::parse(EVENTS)).len(), 2);

    let strip = |rows: Vec<Value>| -> Vec<Value> {
        rows.into_iter()
            .map(|mut row| {
                row.as_object_mut().unwrap().remove("synced_at");
                row
            })
            .collect()
    };
    assert_eq!(strip(first), strip(second));
}

#[tokio::test]
async fn test_missing_client_is_reported() {
    let fx = Fixture::new();
    let outcome = SyncCoordinator::new(None, fx.config.clone())
        .sync(&summary())
        .await;
    assert_eq!(outcome.error, Some(SyncErrorTag::ClientMissing));
    assert!(outcome.synced_tables.is_empty());
}

#[tokio::test]
async fn test_discovery_falls_through_helpers() {
    let fx = Fixture::new();
    let store = Arc::new(
        MemoryStore::new()
            .failing_procedure("list_tables_ext")
            .with_procedure("list_tables_all", json!([]))
            .with_procedure("list_public_tables", json!(["users"]))
            .with_table("users", Vec::new())
            .with_table(REGISTRY, Vec::new())
            .with_table(EVENTS, Vec::new()),
    );

    let outcome = fx.coordinator(&store).sync(&summary()).await;

    assert_eq!(outcome.error, None);
    assert_eq!(outcome.synced_tables, vec!["users"]);
    let registry = store.rows(&TableRef::parse(REGISTRY));
    assert_eq!(registry_row(&registry, "users")["schema_name"], "public");
}

#[tokio::test]
async fn test_no_tables_aborts_before_any_write() {
    let fx = Fixture::new();
    fx.write_artifact("payload_map.md", "# Payload Registry\n");
    let store = Arc::new(
        MemoryStore::new()
            .with_table(REGISTRY, Vec::new())
            .with_table(DOCUMENTS, Vec::new())
            .with_table(EVENTS, Vec::new()),
    );

    let outcome = fx.coordinator(&store).sync(&summary()).await;

    assert_eq!(outcome.error, Some(SyncErrorTag::NoTables));
    assert!(store.rows(&TableRef::parse(DOCUMENTS)).is_empty());
    assert!(store.rows(&TableRef::parse(EVENTS)).is_empty());
}

#[tokio::test]
async fn test_unreachable_registry_aborts() {
    let fx = Fixture::new();
    let store = Arc::new(
        MemoryStore::new()
            .with_procedure("list_tables_ext", json!(["notes"]))
            .with_table("notes", Vec::new()),
    );

    let outcome = fx.coordinator(&store).sync(&summary()).await;
    assert_eq!(outcome.error, Some(SyncErrorTag::RegistryMissing));
    assert!(outcome.synced_tables.is_empty());
}

#[tokio::test]
async fn test_rejected_table_is_skipped_not_fatal() {
    let fx = Fixture::new();
    let store = Arc::new(
        ready_store()
            .rejecting_writes(&format!("{REGISTRY}:public.notes"))
            .failing_select("public.users"),
    );

    let outcome = fx.coordinator(&store).sync(&summary()).await;

    assert_eq!(outcome.error, None);
    assert_eq!(outcome.synced_tables, vec!["public.users"]);
    assert!(outcome.document_refs.is_empty());
    let registry = store.rows(&TableRef::parse(REGISTRY));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0]["document_refs"], Value::Null);
}

#[tokio::test]
async fn test_rejected_document_is_skipped() {
    let fx = Fixture::new();
    fx.write_artifact("payload_map.md", "# Payload Registry\n");
    fx.write_artifact("routes.md", "# Routes\n");
    let store = Arc::new(ready_store().rejecting_writes(&format!("{DOCUMENTS}:payload_map_md")));

    let outcome = fx.coordinator(&store).sync(&summary()).await;

    assert_eq!(outcome.document_refs, vec!["routes_md"]);
    assert_eq!(outcome.synced_tables.len(), 2);
}
