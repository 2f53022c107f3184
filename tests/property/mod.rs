//! Property-based tests for safeguard.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold across cache keys, breakers and retry.

pub mod circuit_breaker;
