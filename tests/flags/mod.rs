//! Feature flag tests.
//!
//! - kill_switch.rs: create, read and toggle through the cache
//! - shared_cache.rs: several service instances over one cache
