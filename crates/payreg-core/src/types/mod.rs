//! Domain types for the payload registry scanner.
//!
//! # Module Organization
//!
//! - [`model`] - Schema model descriptors and the per-run model registry
//! - [`route`] - Route parameters, payload shapes, and registered routes
//! - [`summary`] - Drift reports and the persisted run summary
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use payreg_core::{ModelDescriptor, PayloadShape, Summary};
//! ```

pub mod model;
pub mod route;
pub mod summary;

pub use model::{BareCollision, FieldDescriptor, ModelDescriptor, ModelKind, ModelRegistry};
pub use route::{PayloadShape, RegisteredRoute, RouteParameter};
pub use summary::{DriftReport, Summary, SummarySnapshot};
