use crate::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg(feature = "metrics")]
use metrics::counter;

/// Keys removed per backend round trip during pattern invalidation.
const INVALIDATE_BATCH: usize = 500;

/// Best-effort cache-aside client.
///
/// Every public operation succeeds from the caller's point of view: backend
/// failures are logged and reported as a miss, `false` or `0`. A store whose
/// backend could not be reached at startup stays disconnected for its whole
/// lifetime and answers every call with the same safe defaults. Each backend
/// round trip is bounded by the operation timeout, so a hung server also
/// degrades to the safe default instead of stalling the caller.
///
/// Cloning is cheap and clones share the backend.
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    default_ttl: Duration,
    operation_timeout: Duration,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("provider", &self.provider_name())
            .field("default_ttl", &self.default_ttl)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl CacheStore {
    /// Connects using `config`.
    ///
    /// Falls back to disconnected mode when no URL is configured, when the
    /// crate was built without the `redis` feature, or when connecting or the
    /// initial PING fails within `connect_timeout`. The reason is logged once.
    pub async fn connect(config: &CacheConfig) -> Self {
        let Some(url) = config.url.as_deref() else {
            warn!("no cache URL configured; caching disabled");
            return Self::disconnected_with_ttl(config.default_ttl)
                .with_operation_timeout(config.operation_timeout);
        };

        match Self::open_backend(url, config.connect_timeout).await {
            Ok(backend) => {
                info!(provider = backend.provider_name(), "cache connected");
                Self {
                    backend: Some(backend),
                    default_ttl: config.default_ttl,
                    operation_timeout: config.operation_timeout,
                }
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "cache unavailable; caching disabled");
                Self::disconnected_with_ttl(config.default_ttl)
                    .with_operation_timeout(config.operation_timeout)
            }
        }
    }

    #[cfg(feature = "redis")]
    async fn open_backend(url: &str, timeout: Duration) -> CacheResult<Arc<dyn CacheBackend>> {
        let backend = crate::backend::RedisBackend::connect(url, timeout).await?;
        bounded(timeout, "PING", backend.ping()).await?;
        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "redis"))]
    async fn open_backend(_url: &str, _timeout: Duration) -> CacheResult<Arc<dyn CacheBackend>> {
        Err(CacheError::Connection(
            "built without the `redis` feature".to_string(),
        ))
    }

    /// Wraps an already constructed backend, running the same PING health
    /// check as [`connect`](Self::connect). Operations use the default
    /// timeout; see [`with_operation_timeout`](Self::with_operation_timeout).
    pub async fn with_backend<B>(backend: B, default_ttl: Option<Duration>) -> Self
    where
        B: CacheBackend + 'static,
    {
        let defaults = CacheConfig::default();
        let default_ttl = default_ttl.unwrap_or(defaults.default_ttl);
        match bounded(defaults.operation_timeout, "PING", backend.ping()).await {
            Ok(()) => Self {
                backend: Some(Arc::new(backend)),
                default_ttl,
                operation_timeout: defaults.operation_timeout,
            },
            Err(e) => {
                warn!(
                    provider = backend.provider_name(),
                    error = %e,
                    "cache health check failed; caching disabled"
                );
                Self::disconnected_with_ttl(default_ttl)
            }
        }
    }

    /// A store with no backend. Every read misses and every write is a no-op.
    pub fn disconnected() -> Self {
        Self::disconnected_with_ttl(CacheConfig::default().default_ttl)
    }

    fn disconnected_with_ttl(default_ttl: Duration) -> Self {
        Self {
            backend: None,
            default_ttl,
            operation_timeout: CacheConfig::default().operation_timeout,
        }
    }

    /// Replaces the bound applied to each backend round trip.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_some()
    }

    /// `"disconnected"` when running without a backend.
    pub fn provider_name(&self) -> &'static str {
        self.backend
            .as_ref()
            .map_or("disconnected", |b| b.provider_name())
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Decoded value under `key`; `None` on a miss or any failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;

        match self.try_get(backend.as_ref(), key).await {
            Ok(Some(value)) => {
                record("hit");
                Some(value)
            }
            Ok(None) => {
                record("miss");
                None
            }
            Err(e) => {
                report("get", key, &e);
                None
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        backend: &dyn CacheBackend,
        key: &str,
    ) -> CacheResult<Option<T>> {
        match bounded(self.operation_timeout, "GET", backend.get(key)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Stores `value` as JSON under `key` for `ttl` (or the default TTL).
    /// Returns whether the write reached the backend.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };
        let ttl = ttl.unwrap_or(self.default_ttl);

        let result = match serde_json::to_string(value) {
            Ok(raw) => {
                bounded(self.operation_timeout, "SETEX", backend.set_ex(key, &raw, ttl)).await
            }
            Err(e) => Err(CacheError::from(e)),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                report("set", key, &e);
                false
            }
        }
    }

    /// Removes `key`. Deleting an absent key still counts as success.
    pub async fn delete(&self, key: &str) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        match bounded(self.operation_timeout, "DEL", backend.delete(key)).await {
            Ok(_) => true,
            Err(e) => {
                report("delete", key, &e);
                false
            }
        }
    }

    /// Deletes every key matching the glob `pattern` and returns how many
    /// were removed. Matches are deleted in batches; batches removed before a
    /// failure are still counted.
    pub async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        let Some(backend) = self.backend.as_ref() else {
            return 0;
        };

        let keys = match bounded(self.operation_timeout, "SCAN", backend.keys(pattern)).await {
            Ok(keys) => keys,
            Err(e) => {
                report("invalidate_pattern", pattern, &e);
                return 0;
            }
        };

        let mut deleted = 0;
        for batch in keys.chunks(INVALIDATE_BATCH) {
            match bounded(self.operation_timeout, "DEL", backend.delete_many(batch)).await {
                Ok(n) => deleted += n,
                Err(e) => {
                    report("invalidate_pattern", pattern, &e);
                    break;
                }
            }
        }

        debug!(pattern, matched = keys.len(), deleted, "invalidated cache keys");
        deleted
    }

    /// Cache-aside read.
    ///
    /// Returns the cached value when present. Otherwise runs `load`, caches a
    /// `Some` result for `ttl` and returns it. `None` results are not cached.
    pub async fn get_or_insert_with<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        load: F,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if let Some(hit) = self.get(key).await {
            return Some(hit);
        }

        let value = load().await?;
        self.set(key, &value, ttl).await;
        Some(value)
    }
}

/// Runs one backend round trip, giving up after `limit`.
async fn bounded<T>(
    limit: Duration,
    op: &'static str,
    call: impl Future<Output = CacheResult<T>>,
) -> CacheResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| CacheError::Timeout(format!("{} after {:?}", op, limit)))?
}

fn report(op: &'static str, key: &str, error: &CacheError) {
    warn!(op, key, kind = error.kind(), error = %error, "cache operation failed");
    record("error");
}

#[cfg(feature = "metrics")]
fn record(result: &'static str) {
    counter!("cache_requests_total", "result" => result).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record(_result: &'static str) {}
