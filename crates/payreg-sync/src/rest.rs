//! PostgREST-style HTTP store.
//!
//! Tables live under `<url>/rest/v1/<table>` and procedures under
//! `<url>/rest/v1/rpc/<name>`. Non-default schemas are selected with the
//! `Accept-Profile` header on reads and `Content-Profile` on writes.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{StoreClient, StoreFuture, StoreResponse, TableRef};

/// Environment variable holding the store base URL.
pub const URL_ENV: &str = "SUPABASE_URL";

/// Environment variable holding the service key.
pub const KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// HTTP client for a PostgREST-compatible store.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use payreg_sync::RestStoreClient;
///
/// let client = RestStoreClient::new(
///     "https://project.supabase.co",
///     "service-role-key",
///     Duration::from_secs(30),
/// )?;
/// # Ok::<(), payreg_sync::StoreError>(())
/// ```
#[derive(Clone)]
pub struct RestStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStoreClient {
    /// Creates a client for `base_url` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for an empty URL or key and
    /// [`StoreError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let api_key = api_key.into();
        if base_url.is_empty() {
            return Err(StoreError::config("store URL is empty"));
        }
        if api_key.is_empty() {
            return Err(StoreError::config("store key is empty"));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Creates a client from optional credentials.
    ///
    /// Returns `Ok(None)` when either credential is missing or blank.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_credentials(
        url: Option<&str>,
        key: Option<&str>,
        timeout: Duration,
    ) -> Result<Option<Self>, StoreError> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        let key = key.map(str::trim).filter(|k| !k.is_empty());
        match (url, key) {
            (Some(url), Some(key)) => Self::new(url, key, timeout).map(Some),
            _ => Ok(None),
        }
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &TableRef) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(builder: RequestBuilder) -> Result<StoreResponse, StoreError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        debug!(status, "Store response");
        Ok(StoreResponse::new(status, data))
    }
}

impl std::fmt::Debug for RestStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStoreClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StoreClient for RestStoreClient {
    fn rpc<'a>(&'a self, function: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            let url = format!("{}/rest/v1/rpc/{function}", self.base_url);
            let builder = self
                .authorized(self.client.post(url))
                .json(&Value::Object(serde_json::Map::new()));
            Self::send(builder).await
        })
    }

    fn select<'a>(
        &'a self,
        table: &'a TableRef,
        columns: &'a str,
        limit: usize,
    ) -> StoreFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .authorized(self.client.get(self.table_url(table)))
                .query(&[("select", columns.to_owned()), ("limit", limit.to_string())]);
            if let Some(schema) = &table.schema {
                builder = builder.header("Accept-Profile", schema);
            }
            Self::send(builder).await
        })
    }

    fn upsert<'a>(
        &'a self,
        table: &'a TableRef,
        row: &'a Value,
        on_conflict: &'a str,
    ) -> StoreFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .authorized(self.client.post(self.table_url(table)))
                .query(&[("on_conflict", on_conflict)])
                .header("Prefer", "resolution=merge-duplicates,return=representation")
                .json(row);
            if let Some(schema) = &table.schema {
                builder = builder.header("Content-Profile", schema);
            }
            Self::send(builder).await
        })
    }

    fn insert<'a>(&'a self, table: &'a TableRef, row: &'a Value) -> StoreFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .authorized(self.client.post(self.table_url(table)))
                .header("Prefer", "return=minimal")
                .json(row);
            if let Some(schema) = &table.schema {
                builder = builder.header("Content-Profile", schema);
            }
            Self::send(builder).await
        })
    }
}
