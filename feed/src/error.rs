//! Error types for the feed application layer.

use dtg_core::backend::BackendError;
use dtg_runtime::metrics::MetricsError;
use dtg_runtime::StoreError;
use thiserror::Error;

/// Errors surfaced by [`FeedSession`](crate::session::FeedSession) and setup
#[derive(Error, Debug)]
pub enum FeedError {
    /// The document store failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The store refused an action (usually because it is shutting down)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The metrics exporter could not start
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

/// Result alias for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
