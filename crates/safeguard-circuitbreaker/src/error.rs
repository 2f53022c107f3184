use thiserror::Error;

/// Errors returned by the `CircuitBreaker` service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitBreakerError<E> {
    /// The breaker refused the call without invoking the inner service.
    #[error("circuit '{name}' is open; call not permitted")]
    OpenCircuit { name: String },

    /// The inner service was invoked and failed.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if the call was rejected by an open circuit.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::OpenCircuit { .. })
    }

    /// Returns the inner error if the wrapped call ran and failed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            CircuitBreakerError::OpenCircuit { .. } => None,
        }
    }
}

impl<E> From<E> for CircuitBreakerError<E> {
    fn from(err: E) -> Self {
        CircuitBreakerError::Inner(err)
    }
}

/// Rejected circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failure_threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("half_open_max_calls must be at least 1")]
    ZeroHalfOpenCalls,
}
