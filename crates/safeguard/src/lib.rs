//! Resilience and dynamic configuration for async services.
//!
//! `safeguard` bundles the pieces a service needs to talk to flaky
//! dependencies and to switch features off at runtime:
//!
//! - **Resilient calls**: [`ResilientLayer`] wraps an outbound call in retry
//!   with exponential backoff, a per-dependency circuit breaker and an
//!   optional fallback
//! - **Circuit breakers** ([`circuitbreaker`]): the state machine and the
//!   [`BreakerRegistry`] holding one breaker per dependency name
//! - **Cache** (`cache` feature): best-effort cache-aside client that turns
//!   outages into misses
//! - **Feature flags** (`flags` feature): cached kill switches
//!
//! # Example
//!
//! ```rust
//! use safeguard::{BreakerRegistry, ResilientConfig};
//! use std::time::Duration;
//! use tower::{service_fn, Layer, ServiceExt};
//!
//! #[derive(Debug, Clone)]
//! struct ListingsDown;
//!
//! # async fn example() {
//! let registry = BreakerRegistry::new();
//!
//! let layer = ResilientConfig::<u64, String, ListingsDown>::builder("listings-api")
//!     .max_attempts(3)
//!     .failure_threshold(5)
//!     .recovery_timeout(Duration::from_secs(30))
//!     .fallback_value("listing temporarily unavailable".to_string())
//!     .build(&registry)
//!     .expect("valid breaker settings");
//!
//! let lookup = layer.layer(service_fn(|id: u64| async move {
//!     Ok::<_, ListingsDown>(format!("listing {id}"))
//! }));
//!
//! assert_eq!(lookup.oneshot(7).await.unwrap(), "listing 7");
//! # }
//! ```
//!
//! # Features
//!
//! - `cache`: re-export `safeguard-cache` as [`cache`]
//! - `flags`: re-export `safeguard-flags` as [`flags`] (implies `cache`)
//! - `redis`: Redis-compatible cache backend
//! - `metrics`: counters and gauges through the `metrics` facade
//! - `serde`: serializable circuit health snapshots
//! - `full`: everything above

pub use safeguard_core as core;

pub use safeguard_circuitbreaker as circuitbreaker;
pub use safeguard_fallback as fallback;
pub use safeguard_retry as retry;

#[cfg(feature = "cache")]
pub use safeguard_cache as cache;

#[cfg(feature = "flags")]
pub use safeguard_flags as flags;

pub use safeguard_circuitbreaker::{BreakerRegistry, CircuitBreakerError, CircuitHealth, CircuitState};

mod resilient;

pub use resilient::{
    Resilient, ResilientConfig, ResilientConfigBuilder, ResilientError, ResilientLayer,
};
