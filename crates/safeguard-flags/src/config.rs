use std::time::Duration;

/// Settings for [`FeatureFlagService`](crate::FeatureFlagService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlagConfig {
    pub(crate) cache_ttl: Duration,
    pub(crate) key_prefix: String,
}

impl Default for FeatureFlagConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            key_prefix: "flag".to_string(),
        }
    }
}

impl FeatureFlagConfig {
    pub fn builder() -> FeatureFlagConfigBuilder {
        FeatureFlagConfigBuilder::default()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Cache key holding the state of `name`, e.g. `flag:payments`.
    pub fn cache_key(&self, name: &str) -> String {
        format!("{}:{}", self.key_prefix, name)
    }
}

/// Builder for [`FeatureFlagConfig`].
#[derive(Debug, Default)]
pub struct FeatureFlagConfigBuilder {
    config: FeatureFlagConfig,
}

impl FeatureFlagConfigBuilder {
    /// How long a resolved state stays cached.
    ///
    /// Keep this short: it bounds how stale a reader in another process can
    /// be after a toggle.
    ///
    /// Default: 60 seconds
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Default: `"flag"`
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    pub fn build(self) -> FeatureFlagConfig {
        self.config
    }
}
