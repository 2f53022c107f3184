use super::CacheBackend;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// In-process backend with per-entry expiry.
///
/// Suitable for tests and for single-instance deployments where the cache
/// does not need to be shared. Expired entries are dropped lazily on access.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    value: String,
    /// `None` when the TTL reaches past what the clock can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.lock();
        let live = entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());
        if live.is_none() {
            entries.remove(key);
        }
        Ok(live)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // SETEX rejects a zero TTL; the shortest real expiry is one second.
        let ttl = ttl.max(Duration::from_secs(1));
        self.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let now = Instant::now();
        Ok(match self.lock().remove(key) {
            Some(entry) if entry.is_live(now) => 1,
            _ => 0,
        })
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        let now = Instant::now();
        let mut entries = self.lock();
        Ok(keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| entry.is_live(now))
            .count() as u64)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| CacheError::Backend(format!("invalid key pattern '{}': {}", pattern, e)))?;

        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| entry.is_live(now));

        Ok(entries
            .keys()
            .filter(|key| matcher.matches(key))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
