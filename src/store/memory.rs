//! In-memory key-value store with TTL support
//!
//! Suitable for local development and tests; contents vanish on restart.

use super::{KvStore, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Ordered in-memory store; expired entries are purged lazily
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    data: Mutex<BTreeMap<String, Entry>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Entry>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn purge_expired(data: &mut BTreeMap<String, Entry>, now: Instant) {
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired(now));
        let removed = before - data.len();
        if removed > 0 {
            debug!("Purged {} expired entries", removed);
        }
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        let entry = Entry {
            value,
            // an unrepresentable deadline means no expiry
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };
        self.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        let mut data = self.lock();

        match data.get(key) {
            Some(entry) if entry.is_expired(now) => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn list(&self, prefix: &str, limit: usize) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let mut data = self.lock();
        Self::purge_expired(&mut data, now);

        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit)
            .map(|(key, _)| key.clone())
            .collect())
    }
}
