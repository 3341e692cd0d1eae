//! Core types, errors, and configuration for the payload registry scanner.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Error types for configuration loading ([`ConfigError`])
//! - Configuration structures ([`Config`] and its sections)
//! - Domain types ([`ModelDescriptor`], [`PayloadShape`], [`DriftReport`], [`Summary`])
//! - The per-run [`ModelRegistry`] used to resolve handler annotations
//! - UTC timestamp formatting ([`clock`])
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use config::{ArtifactConfig, Config, ScanConfig, SyncConfig};
pub use error::ConfigError;
pub use types::{
    BareCollision, DriftReport, FieldDescriptor, ModelDescriptor, ModelKind, ModelRegistry,
    PayloadShape, RegisteredRoute, RouteParameter, Summary, SummarySnapshot,
};

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;
