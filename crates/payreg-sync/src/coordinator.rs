//! Best-effort synchronization of a summary into the external store.
//!
//! Stages run in order: table discovery, registry probe, document upserts,
//! per-table registry upserts, event append. Discovery and the probe can
//! abort the sync; every later failure only drops the affected item.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use payreg_core::{Config, Summary, SyncConfig, clock};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::documents::{ArtifactDocument, DocumentCollector};
use crate::store::{DEFAULT_SCHEMA, StoreClient, TableRef};

/// Why a sync stopped before touching any table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorTag {
    /// No store client was configured.
    ClientMissing,
    /// No discovery helper returned any table.
    NoTables,
    /// The registry table could not be reached.
    RegistryMissing,
}

impl SyncErrorTag {
    /// The tag as reported in outcomes and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientMissing => "client_missing",
            Self::NoTables => "no_tables",
            Self::RegistryMissing => "registry_missing",
        }
    }
}

impl fmt::Display for SyncErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a sync achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Tables whose registry record was written, sorted.
    pub synced_tables: Vec<String>,
    /// Documents that were written, in preparation order.
    pub document_refs: Vec<String>,
    /// Set when the sync stopped early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SyncErrorTag>,
}

impl SyncOutcome {
    fn aborted(tag: SyncErrorTag) -> Self {
        Self {
            error: Some(tag),
            ..Self::default()
        }
    }

    /// Whether the sync stopped early.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.error.is_some()
    }
}

/// Syncs summaries into a [`StoreClient`].
///
/// Never fails: every problem is logged and reflected in the returned
/// [`SyncOutcome`].
///
/// # Examples
///
/// ```
/// use payreg_core::{Config, Summary};
/// use payreg_sync::{SyncCoordinator, SyncErrorTag};
///
/// # tokio_test_block(async {
/// let coordinator = SyncCoordinator::new(None, Config::default());
/// let outcome = coordinator.sync(&Summary::default()).await;
/// assert_eq!(outcome.error, Some(SyncErrorTag::ClientMissing));
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f);
/// # }
/// ```
#[derive(Clone)]
pub struct SyncCoordinator {
    client: Option<Arc<dyn StoreClient>>,
    config: Config,
}

impl SyncCoordinator {
    /// Creates a coordinator; `None` means no store is configured.
    #[must_use]
    pub fn new(client: Option<Arc<dyn StoreClient>>, config: Config) -> Self {
        Self { client, config }
    }

    fn sync_config(&self) -> &SyncConfig {
        &self.config.sync
    }

    fn registry_table(&self) -> TableRef {
        let sync = self.sync_config();
        TableRef::new(&sync.registry_schema, &sync.registry_table)
    }

    /// Runs every stage for `summary`.
    pub async fn sync(&self, summary: &Summary) -> SyncOutcome {
        info!("Store sync started");
        let outcome = self.run_stages(summary).await;
        match outcome.error {
            Some(tag) => info!(error = %tag, "Store sync stopped early"),
            None => info!(
                tables = outcome.synced_tables.len(),
                documents = outcome.document_refs.len(),
                "Store sync finished"
            ),
        }
        outcome
    }

    async fn run_stages(&self, summary: &Summary) -> SyncOutcome {
        let Some(client) = self.client.as_deref() else {
            warn!("Store client not configured; skipping registry sync");
            return SyncOutcome::aborted(SyncErrorTag::ClientMissing);
        };

        let tables = self.discover_tables(client).await;
        if tables.is_empty() {
            warn!("Table discovery returned nothing; aborting registry sync");
            return SyncOutcome::aborted(SyncErrorTag::NoTables);
        }

        let registry = self.registry_table();
        match client.select(&registry, "table_name", 1).await {
            Ok(response) if response.is_success() => {}
            Ok(response) => {
                warn!(table = %registry, status = response.status, "Registry table missing");
                return SyncOutcome::aborted(SyncErrorTag::RegistryMissing);
            }
            Err(e) => {
                warn!(table = %registry, error = %e, "Registry table unreachable");
                return SyncOutcome::aborted(SyncErrorTag::RegistryMissing);
            }
        }

        let documents = DocumentCollector::from_config(&self.config)
            .collect(&summary.timestamp, &clock::utc_timestamp());
        let document_refs = self.sync_documents(client, &documents).await;

        let mut synced_tables = Vec::new();
        for table in &tables {
            if self
                .sync_table(client, &registry, table, summary, &document_refs)
                .await
            {
                synced_tables.push(table.clone());
            }
        }

        log_synced(&synced_tables, &registry);
        self.log_event(client, summary, &synced_tables, &document_refs)
            .await;

        SyncOutcome {
            synced_tables,
            document_refs,
            error: None,
        }
    }

    /// Tries each discovery helper in order; the first non-empty answer wins.
    async fn discover_tables(&self, client: &dyn StoreClient) -> Vec<String> {
        let sync = self.sync_config();
        for helper in &sync.discovery_helpers {
            match client.rpc(helper).await {
                Ok(response) if response.is_success() => {
                    let tables = interpret_discovery(response.rows(), &sync.allowed_schemas);
                    if !tables.is_empty() {
                        debug!(helper = %helper, count = tables.len(), "Discovered tables");
                        return tables;
                    }
                }
                Ok(response) => warn!(
                    helper = %helper,
                    status = response.status,
                    "Table discovery helper failed"
                ),
                Err(e) => warn!(helper = %helper, error = %e, "Table discovery helper failed"),
            }
        }
        warn!("No table discovery helper available");
        Vec::new()
    }

    async fn sync_documents(
        &self,
        client: &dyn StoreClient,
        documents: &[ArtifactDocument],
    ) -> Vec<String> {
        let sync = self.sync_config();
        let table = TableRef::new(&sync.registry_schema, &sync.documents_table);
        let mut synced = Vec::new();

        for document in documents {
            let row = match serde_json::to_value(document) {
                Ok(row) => row,
                Err(e) => {
                    warn!(document = %document.name, error = %e, "Document could not be encoded");
                    continue;
                }
            };
            match client.upsert(&table, &row, "name").await {
                Ok(response) if response.is_success() => synced.push(document.name.clone()),
                Ok(response) => warn!(
                    document = %document.name,
                    status = response.status,
                    "Document upsert rejected"
                ),
                Err(e) => warn!(document = %document.name, error = %e, "Document sync failed"),
            }
        }
        synced
    }

    /// Writes one registry record; `true` when the store accepted it.
    async fn sync_table(
        &self,
        client: &dyn StoreClient,
        registry: &TableRef,
        table: &str,
        summary: &Summary,
        document_refs: &[String],
    ) -> bool {
        let table_ref = TableRef::parse(table);
        let columns: Vec<Value> = sample_columns(client, &table_ref)
            .await
            .into_iter()
            .map(|name| json!({"name": name, "type": "unknown"}))
            .collect();
        let document_refs = if document_refs.is_empty() {
            Value::Null
        } else {
            json!(document_refs)
        };

        let record = json!({
            "table_name": table,
            "routes": routes_for_table(summary, &table_ref.name),
            "columns": columns,
            "synced_at": clock::utc_timestamp(),
            "shape_score_total": summary.shape_score_total,
            "schema_name": table_ref.schema_or_default(),
            "policy_info": [],
            "summary_snapshot": summary.snapshot(),
            "document_refs": document_refs,
        });

        match client.upsert(registry, &record, "table_name").await {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                warn!(
                    table = %table,
                    status = response.status,
                    body = %response.data,
                    "Registry upsert skipped"
                );
                false
            }
            Err(e) => {
                warn!(table = %table, error = %e, "Registry upsert failed");
                false
            }
        }
    }

    async fn log_event(
        &self,
        client: &dyn StoreClient,
        summary: &Summary,
        synced_tables: &[String],
        document_refs: &[String],
    ) {
        let sync = self.sync_config();
        let table = TableRef::new(&sync.registry_schema, &sync.events_table);
        let event = json!({
            "run_id": summary.timestamp,
            "event_type": sync.event_type,
            "event_time": clock::utc_timestamp(),
            "synced_tables": synced_tables,
            "document_refs": document_refs,
            "summary_snapshot": summary.snapshot(),
            "payload_count": summary.payload_shapes.len(),
        });

        match client.insert(&table, &event).await {
            Ok(response) if response.is_success() => debug!(table = %table, "Logged sync event"),
            Ok(response) => warn!(table = %table, status = response.status, "Sync event rejected"),
            Err(e) => warn!(table = %table, error = %e, "Failed to log sync event"),
        }
    }
}

impl fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("client", &self.client.is_some())
            .field("sync", &self.config.sync)
            .finish_non_exhaustive()
    }
}

/// Column names of the first row of `table`; empty when sampling fails.
async fn sample_columns(client: &dyn StoreClient, table: &TableRef) -> Vec<String> {
    match client.select(table, "*", 1).await {
        Ok(response) if response.is_success() => response
            .rows()
            .first()
            .and_then(Value::as_object)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default(),
        Ok(response) => {
            debug!(table = %table, status = response.status, "Column sampling failed");
            Vec::new()
        }
        Err(e) => {
            debug!(table = %table, error = %e, "Column sampling failed");
            Vec::new()
        }
    }
}

/// Turns a discovery helper's rows into sorted, unique table names.
///
/// - Strings are taken as table names.
/// - Rows with `table_name` and `schema_name` are kept when the schema is in
///   `allowed_schemas` and become `schema.table`.
/// - Other rows contribute `table_name` or `tablename`.
///
/// # Examples
///
/// ```
/// use payreg_sync::interpret_discovery;
/// use serde_json::json;
///
/// let rows = [
///     json!({"schema_name": "public", "table_name": "notes"}),
///     json!({"schema_name": "auth", "table_name": "users"}),
/// ];
/// let tables = interpret_discovery(&rows, &["public".to_owned()]);
/// assert_eq!(tables, vec!["public.notes"]);
/// ```
#[must_use]
pub fn interpret_discovery(rows: &[Value], allowed_schemas: &[String]) -> Vec<String> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let names: BTreeSet<String> = if first.is_string() {
        rows.iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect()
    } else if first.get("table_name").is_some() && first.get("schema_name").is_some() {
        rows.iter()
            .filter_map(|row| {
                let table = row.get("table_name")?.as_str().filter(|t| !t.is_empty())?;
                let schema = row
                    .get("schema_name")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_SCHEMA);
                allowed_schemas
                    .iter()
                    .any(|allowed| allowed == schema)
                    .then(|| format!("{schema}.{table}"))
            })
            .collect()
    } else {
        rows.iter()
            .filter_map(|row| {
                ["table_name", "tablename"]
                    .iter()
                    .find_map(|key| row.get(key)?.as_str().filter(|t| !t.is_empty()))
                    .map(str::to_owned)
            })
            .collect()
    };

    names.into_iter().collect()
}

/// Paths of payload shapes whose path contains `table_name`, ignoring case.
#[must_use]
pub fn routes_for_table(summary: &Summary, table_name: &str) -> Vec<String> {
    let needle = table_name.to_lowercase();
    summary
        .payload_shapes
        .iter()
        .filter(|shape| shape.path.to_lowercase().contains(&needle))
        .map(|shape| shape.path.clone())
        .collect()
}

fn log_synced(synced: &[String], registry: &TableRef) {
    let shown = synced.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    let more = synced.len().saturating_sub(5);
    if more > 0 {
        info!(
            count = synced.len(),
            registry = %registry,
            "Synced tables: {shown}, ... (+{more} more)"
        );
    } else {
        info!(count = synced.len(), registry = %registry, "Synced tables: {shown}");
    }
}
