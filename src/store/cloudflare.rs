//! Cloudflare Workers KV store
//!
//! Talks to the Workers KV REST API so the gateway can share a namespace
//! with an edge deployment.

use super::{KvStore, StoreError, StoreResult};
use crate::config::settings::CloudflareKvConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Page size bounds accepted by the list-keys endpoint
const MIN_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 1000;

/// Shortest TTL the API accepts, in seconds
const MIN_EXPIRATION_TTL: u64 = 60;

/// Standard Cloudflare API envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct KeyInfo {
    name: String,
}

/// Workers KV namespace client
#[derive(Debug, Clone)]
pub struct CloudflareKvStore {
    client: Client,
    config: CloudflareKvConfig,
}

impl CloudflareKvStore {
    pub fn new(config: CloudflareKvConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("deepseek-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create Cloudflare KV HTTP client")?;

        Ok(Self { client, config })
    }

    /// `{api_base}/accounts/{account}/storage/kv/namespaces/{namespace}/{tail...}`
    fn namespace_url(&self, tail: &[&str]) -> StoreResult<Url> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| StoreError::Backend(format!("Invalid Cloudflare API base URL: {}", e)))?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Backend("Cloudflare API base URL cannot carry a path".to_string())
            })?;
            segments
                .pop_if_empty()
                .extend([
                    "accounts",
                    self.config.account_id.as_str(),
                    "storage",
                    "kv",
                    "namespaces",
                    self.config.namespace_id.as_str(),
                ])
                .extend(tail);
        }

        Ok(url)
    }

    /// Turn a failed response into a `StoreError`, preferring the API's own message
    async fn api_error(response: Response) -> StoreError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        match serde_json::from_str::<Envelope<serde_json::Value>>(&text) {
            Ok(envelope) if !envelope.errors.is_empty() => {
                let first = &envelope.errors[0];
                StoreError::Backend(format!("{} (code {})", first.message, first.code))
            }
            _ => StoreError::Backend(format!("Cloudflare API request failed: {} - {}", status, text)),
        }
    }

    /// Read a JSON envelope and fail when `success` is false
    async fn read_envelope<T: for<'de> Deserialize<'de>>(response: Response) -> StoreResult<Option<T>> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            let message = envelope
                .errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(StoreError::Backend(message));
        }

        Ok(envelope.result)
    }
}

#[async_trait]
impl KvStore for CloudflareKvStore {
    fn name(&self) -> &str {
        "cloudflare"
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        let mut url = self.namespace_url(&["values", key])?;
        if let Some(ttl) = ttl {
            let seconds = ttl.as_secs().max(MIN_EXPIRATION_TTL);
            url.query_pairs_mut()
                .append_pair("expiration_ttl", &seconds.to_string());
        }

        debug!("Writing KV key {}", key);

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.config.api_token)
            .header("Content-Type", "text/plain")
            .body(value)
            .send()
            .await?;

        Self::read_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let url = self.namespace_url(&["values", key])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn list(&self, prefix: &str, limit: usize) -> StoreResult<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut url = self.namespace_url(&["keys"])?;
        url.query_pairs_mut()
            .append_pair("prefix", prefix)
            .append_pair("limit", &limit.clamp(MIN_LIST_LIMIT, MAX_LIST_LIMIT).to_string());

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        let keys: Vec<KeyInfo> = Self::read_envelope(response).await?.unwrap_or_default();
        if limit > MAX_LIST_LIMIT {
            warn!("KV list limit {} exceeds one page, truncated to {}", limit, MAX_LIST_LIMIT);
        }

        let mut names: Vec<String> = keys.into_iter().map(|k| k.name).collect();
        names.sort();
        names.truncate(limit);
        Ok(names)
    }
}
