//! Configuration management for the feed.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{FeedError, Result};
use crate::reducer::DEFAULT_MAX_COMMENT_LENGTH;
use dtg_runtime::StoreConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Log filter (trace, debug, info, warn, error, or a full directive)
    pub log_level: String,
    /// Actions buffered for slow observers of the store
    pub broadcast_capacity: usize,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
    /// Longest accepted review comment, in characters
    pub max_comment_length: usize,
    /// Prometheus listener address; metrics are disabled when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl FeedConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            broadcast_capacity: env::var("DTG_ACTION_BROADCAST_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            shutdown_timeout: env::var("DTG_SHUTDOWN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            max_comment_length: env::var("DTG_MAX_COMMENT_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_COMMENT_LENGTH),
            metrics_addr: env::var("DTG_METRICS_ADDR")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Rejects values the runtime cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] for a zero broadcast capacity or a zero
    /// comment limit.
    pub fn validate(&self) -> Result<()> {
        if self.broadcast_capacity == 0 {
            return Err(FeedError::Config(
                "DTG_ACTION_BROADCAST_CAPACITY must be greater than 0".to_string(),
            ));
        }
        if self.max_comment_length == 0 {
            return Err(FeedError::Config(
                "DTG_MAX_COMMENT_LENGTH must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Store settings derived from this configuration
    #[must_use]
    pub const fn store_config(&self) -> StoreConfig {
        StoreConfig::new(
            self.broadcast_capacity,
            Duration::from_secs(self.shutdown_timeout),
        )
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            broadcast_capacity: 16,
            shutdown_timeout: 5,
            max_comment_length: DEFAULT_MAX_COMMENT_LENGTH,
            metrics_addr: None,
        }
    }
}
