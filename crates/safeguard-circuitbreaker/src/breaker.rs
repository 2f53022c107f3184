use crate::circuit::{Circuit, CircuitHealth, CircuitState};
use crate::config::CircuitBreakerConfig;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The shared state record of one named circuit breaker.
///
/// Every [`CircuitBreaker`](crate::CircuitBreaker) service built from the same
/// record sees the same state. Each read-modify-write of the state machine is
/// one critical section under the record's mutex.
pub struct Breaker {
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
}

impl Breaker {
    /// Creates a closed breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        crate::describe_metrics();

        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Mutex::new(Circuit::new(Arc::clone(&state_atomic))),
            state_atomic,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Decides whether a call may proceed.
    ///
    /// A `true` answer must be followed by exactly one
    /// [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure).
    pub async fn try_acquire(&self) -> bool {
        let mut circuit = self.circuit.lock().await;
        circuit.try_acquire(&self.config)
    }

    /// Admission as a guard. The permit records the outcome of the call it
    /// admitted; dropping it unsettled counts as a failure, so a call that is
    /// cancelled mid-flight never keeps a half-open trial slot.
    pub async fn acquire(self: &Arc<Self>) -> Option<CallPermit> {
        if self.try_acquire().await {
            Some(CallPermit {
                breaker: Arc::clone(self),
                settled: false,
            })
        } else {
            None
        }
    }

    pub async fn record_success(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.record_success(&self.config);
    }

    pub async fn record_failure(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.record_failure(&self.config);
    }

    /// Forces the circuit into the open state.
    pub async fn force_open(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_open(&self.config);
    }

    /// Forces the circuit into the closed state.
    pub async fn force_closed(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_closed(&self.config);
    }

    /// Closes the circuit and clears failure history.
    pub async fn reset(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.reset(&self.config);
    }

    /// Returns the current state of the circuit.
    pub async fn state(&self) -> CircuitState {
        self.circuit.lock().await.state()
    }

    /// Returns the current state without waiting on the record's lock.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state_sync() == CircuitState::Open
    }

    /// Consistent snapshot of state, failure count and last failure time.
    pub async fn health(&self) -> CircuitHealth {
        self.circuit.lock().await.health()
    }

    /// "healthy", "degraded" (half-open) or "unhealthy" (open).
    pub fn health_status(&self) -> &'static str {
        match self.state_sync() {
            CircuitState::Closed => "healthy",
            CircuitState::HalfOpen => "degraded",
            CircuitState::Open => "unhealthy",
        }
    }

    /// 503 while open, 200 otherwise.
    pub fn http_status(&self) -> u16 {
        match self.state_sync() {
            CircuitState::Open => 503,
            CircuitState::Closed | CircuitState::HalfOpen => 200,
        }
    }
}

/// One admitted call, returned by [`Breaker::acquire`].
#[must_use = "dropping a permit records a failure"]
pub struct CallPermit {
    breaker: Arc<Breaker>,
    settled: bool,
}

impl CallPermit {
    pub async fn success(mut self) {
        self.settled = true;
        self.breaker.record_success().await;
    }

    pub async fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure().await;
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(breaker = self.breaker.name(), "call abandoned; recording failure");

        if let Ok(mut circuit) = self.breaker.circuit.try_lock() {
            circuit.record_failure(&self.breaker.config);
            return;
        }

        // Lock is busy; settle from a task instead of blocking in drop.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let breaker = Arc::clone(&self.breaker);
            handle.spawn(async move { breaker.record_failure().await });
        }
    }
}

impl std::fmt::Debug for CallPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallPermit")
            .field("breaker", &self.breaker.config.name)
            .field("settled", &self.settled)
            .finish()
    }
}

impl std::fmt::Debug for Breaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Breaker")
            .field("name", &self.config.name)
            .field("state", &self.state_sync())
            .finish()
    }
}
