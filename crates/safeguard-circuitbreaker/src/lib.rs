//! Circuit breaker pattern for Tower services.
//!
//! A circuit breaker stops calling a dependency that keeps failing, then
//! tries it again with a few trial calls once a recovery timeout has passed.
//!
//! ## States
//! - **Closed**: all calls pass; consecutive failures are counted
//! - **Open**: calls are rejected with [`CircuitBreakerError::OpenCircuit`]
//! - **Half-Open**: up to `half_open_max_calls` trial calls pass; that many
//!   successes close the circuit, any failure reopens it
//!
//! There are no timers. The move from Open to Half-Open happens during the
//! admission check of the first call made after the recovery timeout.
//!
//! ## Usage
//!
//! ```rust
//! use safeguard_circuitbreaker::{BreakerRegistry, CircuitBreakerConfig};
//! use std::time::Duration;
//! use tower::{service_fn, Service, ServiceBuilder, ServiceExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = BreakerRegistry::new();
//! let layer = registry.layer(
//!     CircuitBreakerConfig::builder()
//!         .name("listings-api")
//!         .failure_threshold(5)
//!         .recovery_timeout(Duration::from_secs(30))
//!         .build_config()?,
//! );
//!
//! let mut service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(service_fn(|id: u64| async move { Ok::<_, std::io::Error>(id * 2) }));
//!
//! let doubled = service.ready().await?.call(21).await?;
//! assert_eq!(doubled, 42);
//! # Ok(())
//! # }
//! ```

use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::task::{Context, Poll};
use tower::Service;
#[cfg(feature = "tracing")]
use tracing::{debug, trace};

pub use breaker::{Breaker, CallPermit};
pub use circuit::{CircuitHealth, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::{CircuitBreakerError, ConfigError};
pub use events::CircuitBreakerEvent;
pub use layer::CircuitBreakerLayer;
pub use registry::BreakerRegistry;

mod breaker;
mod circuit;
mod config;
mod error;
mod events;
mod layer;
mod registry;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

pub(crate) fn describe_metrics() {
    #[cfg(feature = "metrics")]
    METRICS_INIT.call_once(|| {
        describe_counter!(
            "circuitbreaker_calls_total",
            "Total number of calls through the circuit breaker"
        );
        describe_counter!(
            "circuitbreaker_transitions_total",
            "Total number of circuit breaker state transitions"
        );
        describe_gauge!(
            "circuitbreaker_state",
            "Current state of the circuit breaker (0 closed, 1 open, 2 half-open)"
        );
    });
}

/// A Tower Service that applies circuit breaker logic to an inner service.
///
/// Each call asks the shared [`Breaker`] for admission, runs the inner
/// service if admitted, and records the outcome once. A call dropped before
/// the inner service answers is recorded as a failure.
pub struct CircuitBreaker<S> {
    inner: S,
    breaker: Arc<Breaker>,
}

impl<S> CircuitBreaker<S> {
    /// Wraps `inner` with the given breaker record.
    pub fn new(inner: S, breaker: Arc<Breaker>) -> Self {
        Self { inner, breaker }
    }

    /// The breaker record this service reports to.
    pub fn breaker(&self) -> &Arc<Breaker> {
        &self.breaker
    }

    /// Forces the circuit into the open state.
    pub async fn force_open(&self) {
        self.breaker.force_open().await;
    }

    /// Forces the circuit into the closed state.
    pub async fn force_closed(&self) {
        self.breaker.force_closed().await;
    }

    /// Resets the circuit to the closed state and clears counts.
    pub async fn reset(&self) {
        self.breaker.reset().await;
    }

    /// Returns the current state of the circuit.
    pub async fn state(&self) -> CircuitState {
        self.breaker.state().await
    }

    /// Returns the current state of the circuit without requiring async context.
    pub fn state_sync(&self) -> CircuitState {
        self.breaker.state_sync()
    }

    /// Returns whether the circuit is currently open.
    pub fn is_open(&self) -> bool {
        self.breaker.is_open()
    }

    pub async fn health(&self) -> CircuitHealth {
        self.breaker.health().await
    }
}

impl<S> Clone for CircuitBreaker<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            breaker: Arc::clone(&self.breaker),
        }
    }
}

impl<S> std::fmt::Debug for CircuitBreaker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("breaker", &self.breaker)
            .finish_non_exhaustive()
    }
}

impl<S, Req> Service<Req> for CircuitBreaker<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = CircuitBreakerError<S::Error>;
    type Future = BoxFuture<'static, Result<S::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(CircuitBreakerError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let breaker = Arc::clone(&self.breaker);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            #[cfg(feature = "tracing")]
            debug!(breaker = breaker.name(), "checking circuit breaker admission");

            let Some(permit) = breaker.acquire().await else {
                #[cfg(feature = "tracing")]
                trace!(breaker = breaker.name(), "call rejected by open circuit");

                return Err(CircuitBreakerError::OpenCircuit {
                    name: breaker.name().to_string(),
                });
            };

            // Dropping this future while the inner call runs drops the permit,
            // which records a failure.
            let result = inner.call(req).await;

            match &result {
                Ok(_) => permit.success().await,
                Err(_) => permit.failure().await,
            }

            result.map_err(CircuitBreakerError::Inner)
        })
    }
}
