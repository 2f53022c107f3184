use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum CircuitState {
    /// Calls flow through; failures are counted.
    Closed = 0,
    /// Calls are rejected until the recovery timeout has passed.
    Open = 1,
    /// A bounded number of trial calls are let through.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    /// Lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only health snapshot of one breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitHealth {
    pub state: CircuitState,
    /// Consecutive failures since the last success or close.
    pub failure_count: u32,
    /// Wall-clock time of the most recent recorded failure.
    pub last_failure: Option<SystemTime>,
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    failure_count: u32,
    success_count: u32,
    half_open_calls: u32,
    // Monotonic, drives the recovery decision.
    last_failure: Option<Instant>,
    // Wall clock, only reported.
    last_failure_at: Option<SystemTime>,
    last_state_change: Instant,
}

impl Circuit {
    pub(crate) fn new(state_atomic: Arc<AtomicU8>) -> Self {
        state_atomic.store(CircuitState::Closed as u8, Ordering::Release);
        Self {
            state: CircuitState::Closed,
            state_atomic,
            failure_count: 0,
            success_count: 0,
            half_open_calls: 0,
            last_failure: None,
            last_failure_at: None,
            last_state_change: Instant::now(),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn health(&self) -> CircuitHealth {
        CircuitHealth {
            state: self.state,
            failure_count: self.failure_count,
            last_failure: self.last_failure_at,
        }
    }

    #[cfg(test)]
    pub(crate) fn counters(&self) -> (u32, u32, u32) {
        (self.failure_count, self.success_count, self.half_open_calls)
    }

    /// Admission check. May move Open to HalfOpen as a side effect; the call
    /// that triggers that move is the first half-open trial.
    pub fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> bool {
        let permitted = match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                // A forced open counts from the transition, not an older failure.
                let since = self
                    .last_failure
                    .map_or(self.last_state_change, |t| t.max(self.last_state_change));
                if since.elapsed() >= config.recovery_timeout {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.half_open_calls += 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if self.half_open_calls < config.half_open_max_calls {
                    self.half_open_calls += 1;
                    true
                } else {
                    false
                }
            }
        };

        if permitted {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallPermitted {
                    name: config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    state: self.state,
                });
        } else {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallRejected {
                    name: config.name.clone(),
                    timestamp: std::time::Instant::now(),
                });

            #[cfg(feature = "metrics")]
            counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "rejected").increment(1);
        }

        permitted
    }

    pub fn record_success(&mut self, config: &CircuitBreakerConfig) {
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                name: config.name.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "success").increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                self.success_count += 1;
                if self.success_count >= config.half_open_max_calls {
                    self.transition_to(CircuitState::Closed, config);
                }
            }
            CircuitState::Closed | CircuitState::Open => {
                self.failure_count = 0;
            }
        }
    }

    pub fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                name: config.name.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "failure").increment(1);

        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure = Some(Instant::now());
        self.last_failure_at = Some(SystemTime::now());

        match self.state {
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open, config),
            CircuitState::Closed if self.failure_count >= config.failure_threshold => {
                self.transition_to(CircuitState::Open, config)
            }
            _ => {}
        }
    }

    pub fn force_open(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Open, config);
    }

    pub fn force_closed(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    /// Closes the circuit and forgets the failure history.
    pub fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
        self.failure_count = 0;
        self.success_count = 0;
        self.half_open_calls = 0;
        self.last_failure = None;
        self.last_failure_at = None;
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                name: config.name.clone(),
                timestamp: std::time::Instant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %config.name, from = %from_state, to = %state, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);
            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone())
                .set(state as u8 as f64);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();

        match state {
            CircuitState::Closed => {
                self.failure_count = 0;
                self.success_count = 0;
                self.half_open_calls = 0;
            }
            CircuitState::HalfOpen | CircuitState::Open => {
                self.success_count = 0;
                self.half_open_calls = 0;
            }
        }
    }
}
