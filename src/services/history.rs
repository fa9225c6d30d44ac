//! Chat history logging
//!
//! Usage summaries are written best-effort: a failed write is logged and
//! never reaches the caller of the chat operation.

use crate::models::ChatLogEntry;
use crate::store::{KvStore, StoreResult};
use crate::utils::error::{AppError, AppResult};
use crate::utils::timestamp::millis_to_iso;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix shared by every history key
pub const HISTORY_KEY_PREFIX: &str = "chat_";
/// Keys scanned for the stats endpoint
pub const STATS_SCAN_LIMIT: usize = 100;
/// Entries reported as recent by the stats endpoint
pub const STATS_RECENT_COUNT: usize = 10;

const KEY_SUFFIX_LEN: usize = 9;

/// Build a history key: `chat_<epochMillis>_<suffix>`
pub fn history_key(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}{}_{}",
        HISTORY_KEY_PREFIX,
        now.timestamp_millis(),
        &suffix[..KEY_SUFFIX_LEN]
    )
}

/// Millisecond timestamp embedded in a history key
pub fn key_timestamp_millis(key: &str) -> Option<i64> {
    key.strip_prefix(HISTORY_KEY_PREFIX)?
        .split('_')
        .next()?
        .parse()
        .ok()
}

/// Stats payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    /// Keys found, capped at the scan limit
    pub total_chats: usize,
    /// Newest entries first
    pub recent_chats: Vec<RecentChat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentChat {
    pub key: String,
    pub timestamp: Option<String>,
}

/// Writes and reads chat usage records
#[derive(Clone)]
pub struct HistoryLogger {
    store: Option<Arc<dyn KvStore>>,
    ttl: Duration,
}

impl std::fmt::Debug for HistoryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLogger")
            .field("store", &self.store.as_ref().map(|s| s.name().to_string()))
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl HistoryLogger {
    pub fn new(store: Option<Arc<dyn KvStore>>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Record a completed chat; never fails
    pub async fn log(&self, entry: &ChatLogEntry) {
        let Some(store) = &self.store else {
            debug!("History store not configured, skipping usage log");
            return;
        };

        match self.write(store.as_ref(), entry).await {
            Ok(key) => debug!("Chat usage logged under {}", key),
            Err(e) => warn!("Failed to log chat usage: {}", e),
        }
    }

    async fn write(&self, store: &dyn KvStore, entry: &ChatLogEntry) -> StoreResult<String> {
        let key = history_key(Utc::now());
        let value = serde_json::to_string(entry)?;
        store.put(&key, value, Some(self.ttl)).await?;
        Ok(key)
    }

    /// Key count and the newest keys
    pub async fn stats(&self) -> AppResult<HistoryStats> {
        let store = self.store.as_ref().ok_or(AppError::StorageUnavailable)?;
        let keys = store.list(HISTORY_KEY_PREFIX, STATS_SCAN_LIMIT).await?;

        let mut recent: Vec<(Option<i64>, String)> = keys
            .iter()
            .map(|key| (key_timestamp_millis(key), key.clone()))
            .collect();
        // newest first; keys without a parsable timestamp sink to the end
        recent.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        Ok(HistoryStats {
            total_chats: keys.len(),
            recent_chats: recent
                .into_iter()
                .take(STATS_RECENT_COUNT)
                .map(|(millis, key)| RecentChat {
                    key,
                    timestamp: millis.and_then(millis_to_iso),
                })
                .collect(),
        })
    }

    /// Entries in the `[offset, offset + limit)` window of stored keys
    ///
    /// Storage failures degrade to an empty or partial result; unreadable
    /// entries are skipped.
    pub async fn entries(&self, limit: usize, offset: usize) -> Vec<ChatLogEntry> {
        let Some(store) = &self.store else {
            debug!("History store not configured, returning no entries");
            return Vec::new();
        };

        let keys = match store
            .list(HISTORY_KEY_PREFIX, limit.saturating_add(offset))
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list chat history: {}", e);
                return Vec::new();
            }
        };

        let reads = keys
            .iter()
            .skip(offset)
            .take(limit)
            .map(|key| Self::read_entry(store.as_ref(), key));

        futures::future::join_all(reads)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn read_entry(store: &dyn KvStore, key: &str) -> Option<ChatLogEntry> {
        match store.get(key).await {
            Ok(Some(value)) => match serde_json::from_str(&value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable history entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read history entry {}: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Usage;
    use crate::store::{InMemoryKvStore, StoreError};
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl KvStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn put(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> StoreResult<()> {
            Err(StoreError::Backend("write refused".to_string()))
        }

        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Backend("read refused".to_string()))
        }

        async fn list(&self, _prefix: &str, _limit: usize) -> StoreResult<Vec<String>> {
            Err(StoreError::Backend("list refused".to_string()))
        }
    }

    fn entry(model: &str) -> ChatLogEntry {
        ChatLogEntry {
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            model: model.to_string(),
            messages_count: 1,
            tokens_used: Usage::default(),
            request_id: None,
        }
    }

    #[test]
    fn test_history_key_format() {
        let now = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        let key = history_key(now);

        assert!(key.starts_with("chat_1700000000123_"));
        let suffix = key.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(key_timestamp_millis(&key), Some(1_700_000_000_123));
    }

    #[test]
    fn test_history_keys_are_unique() {
        let now = Utc::now();
        assert_ne!(history_key(now), history_key(now));
    }

    #[test]
    fn test_key_timestamp_rejects_foreign_keys() {
        assert_eq!(key_timestamp_millis("session_123_abc"), None);
        assert_eq!(key_timestamp_millis("chat_notanumber_abc"), None);
    }

    #[tokio::test]
    async fn test_log_without_store_is_noop() {
        let logger = HistoryLogger::new(None, Duration::from_secs(60));
        logger.log(&entry("deepseek-chat")).await;
        assert!(!logger.is_enabled());
        assert!(matches!(logger.stats().await, Err(AppError::StorageUnavailable)));
        assert!(logger.entries(10, 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_log_failure_is_swallowed() {
        let logger = HistoryLogger::new(Some(Arc::new(FailingStore) as Arc<dyn KvStore>), Duration::from_secs(60));
        logger.log(&entry("deepseek-chat")).await;
        assert!(logger.entries(10, 0).await.is_empty());
        assert!(matches!(logger.stats().await, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_stats_orders_newest_first() {
        let store = Arc::new(InMemoryKvStore::new());
        for millis in [1_000, 3_000, 2_000] {
            store
                .put(&format!("chat_{}_abc", millis), "{}".to_string(), None)
                .await
                .unwrap();
        }
        let logger = HistoryLogger::new(Some(store as Arc<dyn KvStore>), Duration::from_secs(60));

        let stats = logger.stats().await.unwrap();
        assert_eq!(stats.total_chats, 3);
        assert_eq!(stats.recent_chats[0].key, "chat_3000_abc");
        assert_eq!(stats.recent_chats[2].key, "chat_1000_abc");
        assert_eq!(
            stats.recent_chats[0].timestamp.as_deref(),
            Some("1970-01-01T00:00:03.000Z")
        );
    }

    #[tokio::test]
    async fn test_entries_window_skips_unreadable() {
        let store = Arc::new(InMemoryKvStore::new());
        for (i, model) in ["a", "b", "c", "d"].iter().enumerate() {
            let value = serde_json::to_string(&entry(model)).unwrap();
            store.put(&format!("chat_{}_x", 1000 + i), value, None).await.unwrap();
        }
        store.put("chat_1004_x", "not json".to_string(), None).await.unwrap();
        let logger = HistoryLogger::new(Some(store as Arc<dyn KvStore>), Duration::from_secs(60));

        let window: Vec<String> = logger.entries(2, 1).await.into_iter().map(|e| e.model).collect();
        assert_eq!(window, vec!["b", "c"]);

        let tail: Vec<String> = logger.entries(10, 3).await.into_iter().map(|e| e.model).collect();
        assert_eq!(tail, vec!["d"]);
    }
}
