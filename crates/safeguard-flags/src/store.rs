use crate::error::FlagStoreError;
use crate::model::FeatureFlag;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Persistent home of feature flags.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Point lookup by name.
    async fn find(&self, name: &str) -> Result<Option<FeatureFlag>, FlagStoreError>;

    /// Inserts `flag`, failing with [`FlagStoreError::AlreadyExists`] if the
    /// name is taken.
    async fn insert(&self, flag: FeatureFlag) -> Result<FeatureFlag, FlagStoreError>;

    /// Sets `is_enabled` on the named flag and bumps `updated_at`. Returns
    /// whether a flag matched.
    async fn set_enabled(&self, name: &str, is_enabled: bool) -> Result<bool, FlagStoreError>;
}

#[async_trait]
impl<T> FlagStore for Arc<T>
where
    T: FlagStore + ?Sized,
{
    async fn find(&self, name: &str) -> Result<Option<FeatureFlag>, FlagStoreError> {
        (**self).find(name).await
    }

    async fn insert(&self, flag: FeatureFlag) -> Result<FeatureFlag, FlagStoreError> {
        (**self).insert(flag).await
    }

    async fn set_enabled(&self, name: &str, is_enabled: bool) -> Result<bool, FlagStoreError> {
        (**self).set_enabled(name, is_enabled).await
    }
}

/// Flag store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryFlagStore {
    flags: RwLock<HashMap<String, FeatureFlag>>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.flags.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FlagStore for InMemoryFlagStore {
    async fn find(&self, name: &str) -> Result<Option<FeatureFlag>, FlagStoreError> {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        Ok(flags.get(name).cloned())
    }

    async fn insert(&self, flag: FeatureFlag) -> Result<FeatureFlag, FlagStoreError> {
        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        if flags.contains_key(&flag.name) {
            return Err(FlagStoreError::AlreadyExists { name: flag.name });
        }
        flags.insert(flag.name.clone(), flag.clone());
        Ok(flag)
    }

    async fn set_enabled(&self, name: &str, is_enabled: bool) -> Result<bool, FlagStoreError> {
        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        match flags.get_mut(name) {
            Some(flag) => {
                flag.is_enabled = is_enabled;
                flag.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
