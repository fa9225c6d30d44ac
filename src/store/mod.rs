//! Key-value store module
//!
//! Chat history is kept in an external key-value store with per-key TTL.
//! The gateway only needs put/get/list, so backends stay small.

pub mod cloudflare;
pub mod memory;

use crate::config::settings::{HistoryConfig, StoreBackend};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub use cloudflare::CloudflareKvStore;
pub use memory::InMemoryKvStore;

/// Key-value store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend rejected the operation
    #[error("KV storage error: {0}")]
    Backend(String),

    /// Transport failure talking to a remote backend
    #[error("KV storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Value could not be encoded or decoded
    #[error("KV storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal key-value store contract
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Write a value, expiring after `ttl` when given
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()>;

    /// Read a value; `None` when absent or expired
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// List up to `limit` live keys starting with `prefix`, in ascending order
    async fn list(&self, prefix: &str, limit: usize) -> StoreResult<Vec<String>>;
}

/// Build the configured store, or `None` when history is disabled
pub fn from_settings(config: &HistoryConfig) -> Result<Option<Arc<dyn KvStore>>> {
    let store: Option<Arc<dyn KvStore>> = match config.backend {
        StoreBackend::None => None,
        StoreBackend::Memory => Some(Arc::new(InMemoryKvStore::new())),
        StoreBackend::Cloudflare => {
            let cloudflare = config
                .cloudflare
                .clone()
                .context("Cloudflare KV backend selected but not configured")?;
            Some(Arc::new(CloudflareKvStore::new(cloudflare)?))
        }
    };

    match &store {
        Some(store) => info!("Chat history store: {}", store.name()),
        None => info!("Chat history store not configured, history and stats disabled"),
    }

    Ok(store)
}
