//! Events emitted by the fallback service.

use safeguard_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the fallback service.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// The inner service succeeded; no fallback was needed.
    Success { name: String, timestamp: Instant },

    /// The inner service failed and the fallback produced a response.
    Applied {
        name: String,
        timestamp: Instant,
        /// Which strategy produced the response.
        strategy: &'static str,
    },

    /// The backup service of a service strategy failed too.
    Failed { name: String, timestamp: Instant },

    /// The error was not selected by the handle predicate and passed through.
    Skipped { name: String, timestamp: Instant },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Applied { .. } => "applied",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Success { timestamp, .. }
            | Self::Applied { timestamp, .. }
            | Self::Failed { timestamp, .. }
            | Self::Skipped { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            Self::Success { name, .. }
            | Self::Applied { name, .. }
            | Self::Failed { name, .. }
            | Self::Skipped { name, .. } => name,
        }
    }
}
