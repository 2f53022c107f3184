use safeguard_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the retry middleware.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and another one follows after `delay`.
    Retry {
        name: String,
        timestamp: Instant,
        /// 1 for the first retry.
        attempt: usize,
        delay: Duration,
    },
    /// The call succeeded, possibly after retries.
    Success {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// Every attempt failed; the last error is returned.
    Exhausted {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The error was rejected by the retry predicate and returned at once.
    IgnoredError { name: String, timestamp: Instant },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            RetryEvent::Retry { name, .. }
            | RetryEvent::Success { name, .. }
            | RetryEvent::Exhausted { name, .. }
            | RetryEvent::IgnoredError { name, .. } => name,
        }
    }
}
