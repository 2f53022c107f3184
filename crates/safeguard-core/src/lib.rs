//! Shared infrastructure for the safeguard crates.
//!
//! Every pattern (circuit breaker, retry, fallback) reports what it does through
//! the same listener machinery defined here, so callers can hook logging,
//! counters or assertions onto any of them the same way.

pub mod events;

pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
