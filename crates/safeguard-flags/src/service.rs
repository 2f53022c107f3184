use crate::config::FeatureFlagConfig;
use crate::error::{FlagError, FlagStoreError};
use crate::model::FeatureFlag;
use crate::store::FlagStore;
use safeguard_cache::CacheStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves and mutates feature flags.
///
/// Reads go cache, then store, then the caller's default. Writes go to the
/// store first and then overwrite the cached state so a toggle is visible to
/// the next read in this process immediately, and to other processes within
/// one cache TTL.
#[derive(Clone)]
pub struct FeatureFlagService {
    store: Arc<dyn FlagStore>,
    cache: CacheStore,
    config: FeatureFlagConfig,
}

impl std::fmt::Debug for FeatureFlagService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureFlagService")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

impl FeatureFlagService {
    pub fn new<S>(store: S, cache: CacheStore) -> Self
    where
        S: FlagStore + 'static,
    {
        Self::with_config(store, cache, FeatureFlagConfig::default())
    }

    pub fn with_config<S>(store: S, cache: CacheStore, config: FeatureFlagConfig) -> Self
    where
        S: FlagStore + 'static,
    {
        Self {
            store: Arc::new(store),
            cache,
            config,
        }
    }

    pub fn config(&self) -> &FeatureFlagConfig {
        &self.config
    }

    /// Whether `name` is enabled, or `default` if the flag does not exist or
    /// the store cannot be reached.
    pub async fn get_flag_state(&self, name: &str, default: bool) -> bool {
        let key = self.config.cache_key(name);

        if let Some(state) = self.cache.get::<bool>(&key).await {
            return state;
        }

        match self.store.find(name).await {
            Ok(Some(flag)) => {
                self.cache
                    .set(&key, &flag.is_enabled, Some(self.config.cache_ttl))
                    .await;
                flag.is_enabled
            }
            Ok(None) => {
                debug!(flag = name, default, "unknown feature flag");
                default
            }
            Err(e) => {
                warn!(flag = name, error = %e, default, "flag store unavailable; using default");
                default
            }
        }
    }

    /// Creates `name` unless it already exists.
    ///
    /// An existing flag is returned unchanged, whatever `description` and
    /// `is_enabled` say. If another creator wins a race for the name, its
    /// flag is returned.
    pub async fn create_flag(
        &self,
        name: &str,
        description: Option<String>,
        is_enabled: bool,
    ) -> Result<FeatureFlag, FlagError> {
        if let Some(existing) = self.store.find(name).await? {
            return Ok(existing);
        }

        let flag = FeatureFlag::new(name, description, is_enabled);
        let created = match self.store.insert(flag).await {
            Ok(created) => created,
            Err(FlagStoreError::AlreadyExists { name: taken }) => {
                debug!(flag = name, "lost creation race; returning existing flag");
                return self
                    .store
                    .find(name)
                    .await?
                    .ok_or(FlagError::Store(FlagStoreError::AlreadyExists { name: taken }));
            }
            Err(e) => return Err(e.into()),
        };

        self.cache
            .set(
                &self.config.cache_key(name),
                &created.is_enabled,
                Some(self.config.cache_ttl),
            )
            .await;
        info!(flag = name, enabled = created.is_enabled, "feature flag created");

        Ok(created)
    }

    /// Switches `name` on or off.
    ///
    /// Returns `Ok(false)` if no such flag exists. On success the cached state
    /// is overwritten right away.
    pub async fn toggle_flag(&self, name: &str, is_enabled: bool) -> Result<bool, FlagError> {
        if !self.store.set_enabled(name, is_enabled).await? {
            return Ok(false);
        }

        self.cache
            .set(
                &self.config.cache_key(name),
                &is_enabled,
                Some(self.config.cache_ttl),
            )
            .await;
        info!(flag = name, enabled = is_enabled, "feature flag toggled");

        Ok(true)
    }

    /// Refuses a code path guarded by `name` unless the flag is enabled.
    ///
    /// Unknown flags count as disabled.
    pub async fn require_enabled(&self, name: &str) -> Result<(), FlagError> {
        if self.get_flag_state(name, false).await {
            Ok(())
        } else {
            Err(FlagError::Disabled {
                name: name.to_string(),
            })
        }
    }
}
