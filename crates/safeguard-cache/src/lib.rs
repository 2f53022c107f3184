//! Best-effort cache-aside client over a remote key-value store.
//!
//! [`CacheStore`] never fails from the caller's point of view. Reads return
//! `None` on a miss and on any backend problem, writes report `false`, and
//! pattern invalidation reports `0`. Failures are logged at `warn` and, with
//! the `metrics` feature, counted under `cache_requests_total{result="error"}`
//! so a miss and an outage stay distinguishable in telemetry.
//!
//! # Backends
//!
//! - [`MemoryBackend`]: in-process map with per-entry expiry.
//! - `RedisBackend` (feature `redis`): managed connection to a Redis-compatible
//!   server, enumerating keys with `SCAN`.
//!
//! # Example
//!
//! ```rust
//! use safeguard_cache::{make_key, CacheStore, MemoryBackend};
//! use serde_json::{json, Map};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let cache = CacheStore::with_backend(MemoryBackend::new(), None).await;
//!
//! let key = make_key("listing", &[json!(42)], &Map::new());
//! cache.set(&key, &"Sunny loft", Some(Duration::from_secs(60))).await;
//! assert_eq!(cache.get::<String>(&key).await.as_deref(), Some("Sunny loft"));
//!
//! assert_eq!(cache.invalidate_pattern("listing:*").await, 1);
//! # }
//! ```

mod backend;
mod config;
mod error;
mod key;
mod store;

#[cfg(feature = "redis")]
pub use backend::RedisBackend;
pub use backend::{CacheBackend, MemoryBackend};
pub use config::{CacheConfig, CONNECT_TIMEOUT_ENV, OPERATION_TIMEOUT_ENV, REDIS_URL_ENV};
pub use error::{CacheError, CacheResult};
pub use key::make_key;
pub use store::CacheStore;
