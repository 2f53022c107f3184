use thiserror::Error;

/// Failure reported by a [`FlagStore`](crate::FlagStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlagStoreError {
    /// Another flag already uses this name.
    #[error("feature flag '{name}' already exists")]
    AlreadyExists { name: String },

    /// The store could not be reached or rejected the operation.
    #[error("flag store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`FeatureFlagService`](crate::FeatureFlagService).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error(transparent)]
    Store(#[from] FlagStoreError),

    /// The guarded feature is switched off.
    #[error("feature '{name}' is disabled")]
    Disabled { name: String },
}

impl FlagError {
    pub fn is_disabled(&self) -> bool {
        matches!(self, FlagError::Disabled { .. })
    }
}
