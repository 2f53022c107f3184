//! Remote store adapters.
//!
//! A backend speaks the store's protocol and reports every failure as a
//! [`CacheError`](crate::CacheError). Deciding what a failure means for the
//! caller is left to [`CacheStore`](crate::CacheStore).

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;

use crate::error::CacheResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Operations consumed from the remote key-value store.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Raw payload stored under `key`, `None` on a miss.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl` (SETEX).
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Removes `key`; returns how many keys were removed (0 or 1).
    async fn delete(&self, key: &str) -> CacheResult<u64>;

    /// Removes every key in `keys`; returns how many were removed.
    ///
    /// The default deletes one key at a time and stops at the first error.
    /// Backends with a multi-key delete should override it.
    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        let mut removed = 0;
        for key in keys {
            removed += self.delete(key).await?;
        }
        Ok(removed)
    }

    /// Every live key matching the glob `pattern`.
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;

    /// Round trip used as the health check.
    async fn ping(&self) -> CacheResult<()>;

    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T> CacheBackend for Arc<T>
where
    T: CacheBackend + ?Sized,
{
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        (**self).set_ex(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        (**self).delete(key).await
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        (**self).delete_many(keys).await
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        (**self).keys(pattern).await
    }

    async fn ping(&self) -> CacheResult<()> {
        (**self).ping().await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}
