use crate::breaker::Breaker;
use crate::config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
use crate::CircuitBreaker;
use std::sync::Arc;
use tower::Layer;

/// A Tower Layer that guards an inner service with a circuit breaker.
///
/// All services produced by one layer share a single [`Breaker`], so a layer
/// stands for one downstream dependency.
///
/// ```rust
/// use safeguard_circuitbreaker::CircuitBreakerLayer;
/// use std::time::Duration;
/// use tower::{service_fn, ServiceBuilder};
///
/// let layer = CircuitBreakerLayer::builder()
///     .name("geocoder")
///     .failure_threshold(3)
///     .recovery_timeout(Duration::from_secs(15))
///     .build()
///     .unwrap();
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// ```
#[derive(Clone, Debug)]
pub struct CircuitBreakerLayer {
    breaker: Arc<Breaker>,
}

impl CircuitBreakerLayer {
    /// Wraps an existing breaker record, typically one from a
    /// [`BreakerRegistry`](crate::BreakerRegistry).
    pub fn new(breaker: Arc<Breaker>) -> Self {
        Self { breaker }
    }

    /// Creates a layer owning a fresh breaker built from `config`.
    pub fn from_config(config: CircuitBreakerConfig) -> Self {
        Self::new(Arc::new(Breaker::new(config)))
    }

    /// Creates a new builder for configuring a circuit breaker layer.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// The breaker record shared by services from this layer.
    pub fn breaker(&self) -> &Arc<Breaker> {
        &self.breaker
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreaker<S>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreaker::new(service, Arc::clone(&self.breaker))
    }
}
