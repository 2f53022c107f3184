use crate::circuit::CircuitState;
use crate::error::ConfigError;
use crate::events::CircuitBreakerEvent;
use crate::layer::CircuitBreakerLayer;
use safeguard_core::{EventListeners, FnListener};
use std::time::Duration;

/// Immutable settings of one circuit breaker.
///
/// Produced by [`CircuitBreakerConfigBuilder::build_config`], which guarantees
/// both thresholds are at least 1.
pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) failure_threshold: u32,
    pub(crate) recovery_timeout: Duration,
    pub(crate) half_open_max_calls: u32,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Name the breaker reports in events, logs and health snapshots.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consecutive failures that open a closed circuit.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Minimum time between the last failure and the first half-open trial.
    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    /// Trial calls admitted while half-open; as many successes close the circuit.
    pub fn half_open_max_calls(&self) -> u32 {
        self.half_open_max_calls
    }
}

impl std::fmt::Debug for CircuitBreakerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("name", &self.name)
            .field("failure_threshold", &self.failure_threshold)
            .field("recovery_timeout", &self.recovery_timeout)
            .field("half_open_max_calls", &self.half_open_max_calls)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CircuitBreakerConfig`] and [`CircuitBreakerLayer`].
pub struct CircuitBreakerConfigBuilder {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    half_open_max_calls: u32,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    /// Creates a builder with the default settings.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 3,
            event_listeners: EventListeners::new(),
        }
    }

    /// Give this breaker a name for registry lookup and observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Consecutive failures after which a closed circuit opens.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    /// How long the circuit stays open after the last failure before a
    /// trial call is let through.
    ///
    /// Default: 30 seconds
    pub fn recovery_timeout(mut self, duration: Duration) -> Self {
        self.recovery_timeout = duration;
        self
    }

    /// Trial calls admitted in the half-open state.
    ///
    /// Default: 3
    pub fn half_open_max_calls(mut self, n: u32) -> Self {
        self.half_open_max_calls = n;
        self
    }

    /// Registers a callback invoked with `(from, to)` on every state change.
    ///
    /// ```rust
    /// use safeguard_circuitbreaker::{CircuitBreakerConfig, CircuitState};
    ///
    /// let config = CircuitBreakerConfig::builder()
    ///     .name("payments")
    ///     .on_state_transition(|from, to| {
    ///         if to == CircuitState::Open {
    ///             eprintln!("payments degraded ({from:?} -> {to:?})");
    ///         }
    ///     })
    ///     .build_config()
    ///     .unwrap();
    /// assert_eq!(config.name(), "payments");
    /// ```
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    /// Registers a callback invoked with the state in which a call was admitted.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call is refused.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked after a success is recorded.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Registers a callback invoked after a failure is recorded.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Validates the settings and returns the configuration, for use with a
    /// [`BreakerRegistry`](crate::BreakerRegistry).
    pub fn build_config(self) -> Result<CircuitBreakerConfig, ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        if self.half_open_max_calls == 0 {
            return Err(ConfigError::ZeroHalfOpenCalls);
        }

        Ok(CircuitBreakerConfig {
            name: self.name,
            failure_threshold: self.failure_threshold,
            recovery_timeout: self.recovery_timeout,
            half_open_max_calls: self.half_open_max_calls,
            event_listeners: self.event_listeners,
        })
    }

    /// Validates the settings and returns a layer owning a fresh breaker.
    ///
    /// Every service produced by the layer shares that one breaker.
    pub fn build(self) -> Result<CircuitBreakerLayer, ConfigError> {
        self.build_config().map(CircuitBreakerLayer::from_config)
    }
}
