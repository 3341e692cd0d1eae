//! Synchronization of payload registry summaries into an external store.
//!
//! The store is reached through the [`StoreClient`] capability: named
//! procedures for table discovery plus select, upsert, and insert on
//! schema-qualified tables. [`RestStoreClient`] speaks the PostgREST
//! dialect; [`MemoryStore`] keeps everything in process.
//!
//! [`SyncCoordinator`] drives a sync and always returns a [`SyncOutcome`]:
//!
//! ```text
//! discover tables ─▶ probe registry ─▶ upsert documents ─▶ upsert table records ─▶ append event
//!   no_tables         registry_missing    (per item)          (per item)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use payreg_core::{Config, Summary};
//! use payreg_sync::{RestStoreClient, StoreClient, SyncCoordinator};
//!
//! # async fn run(summary: Summary) -> Result<(), payreg_sync::StoreError> {
//! let client = RestStoreClient::new("https://project.supabase.co", "key", Duration::from_secs(30))?;
//! let client: Arc<dyn StoreClient> = Arc::new(client);
//!
//! let outcome = SyncCoordinator::new(Some(client), Config::default())
//!     .sync(&summary)
//!     .await;
//! println!("synced {} tables", outcome.synced_tables.len());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod coordinator;
mod documents;
mod error;
mod memory;
mod rest;
mod store;

pub use coordinator::{
    SyncCoordinator, SyncErrorTag, SyncOutcome, interpret_discovery, routes_for_table,
};
pub use documents::{
    ARTIFACT_SOURCE, ArtifactDocument, DocumentCollector, DocumentFormat, DocumentMetadata,
    REVIEW_LOG_SOURCE,
};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use rest::{KEY_ENV, RestStoreClient, URL_ENV};
pub use store::{DEFAULT_SCHEMA, StoreClient, StoreFuture, StoreResponse, TableRef};
