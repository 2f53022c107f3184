//! Feature flags and kill switches.
//!
//! [`FeatureFlagService`] answers "is this feature on?" from a short-lived
//! cache entry, falling back to the [`FlagStore`] and finally to a default
//! supplied by the caller. Toggling a flag writes the store and then overwrites
//! the cached state, so switching a feature off takes effect on the next read.
//!
//! ```rust
//! use safeguard_cache::{CacheStore, MemoryBackend};
//! use safeguard_flags::{FeatureFlagService, InMemoryFlagStore};
//!
//! # async fn example() -> Result<(), safeguard_flags::FlagError> {
//! let cache = CacheStore::with_backend(MemoryBackend::new(), None).await;
//! let flags = FeatureFlagService::new(InMemoryFlagStore::new(), cache);
//!
//! flags.create_flag("payments", Some("card checkout".into()), true).await?;
//! assert!(flags.get_flag_state("payments", false).await);
//!
//! // Kill switch
//! flags.toggle_flag("payments", false).await?;
//! assert!(flags.require_enabled("payments").await.is_err());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod model;
mod service;
mod store;

pub use config::{FeatureFlagConfig, FeatureFlagConfigBuilder};
pub use error::{FlagError, FlagStoreError};
pub use model::FeatureFlag;
pub use service::FeatureFlagService;
pub use store::{FlagStore, InMemoryFlagStore};
