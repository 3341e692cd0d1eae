//! Error types for store access.

use thiserror::Error;

/// Errors raised while talking to the external store.
///
/// A response with an error status is not an error at this level; it comes
/// back as a [`StoreResponse`](crate::StoreResponse) so callers can decide
/// whether the status matters for the step they are running.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The client was configured with an unusable URL or key.
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// The store is unreachable for this operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
