//! Cache tests.
//!
//! - store.rs: get/set/delete/invalidate through the in-memory backend
//! - degradation.rs: outages turn into misses
//! - config.rs: environment configuration (serialized, touches process env)
//! - keys.rs: key derivation

mod config;
mod keys;
mod store;
