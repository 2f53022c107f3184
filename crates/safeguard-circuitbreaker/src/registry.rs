//! Named breaker records shared across a process.

use crate::breaker::Breaker;
use crate::circuit::CircuitHealth;
use crate::config::CircuitBreakerConfig;
use crate::layer::CircuitBreakerLayer;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Registry of circuit breakers keyed by dependency name.
///
/// Records are created on first reference and live as long as the registry.
/// Construct one per process and pass clones around; clones share the same
/// map.
///
/// ```rust
/// use safeguard_circuitbreaker::{BreakerRegistry, CircuitBreakerConfig, CircuitState};
///
/// # async fn example() {
/// let registry = BreakerRegistry::new();
/// let config = CircuitBreakerConfig::builder().name("billing").build_config().unwrap();
/// let breaker = registry.get_or_create(config);
///
/// let health = registry.health().await;
/// assert_eq!(health["billing"].state, CircuitState::Closed);
/// # let _ = breaker;
/// # }
/// ```
#[derive(Clone, Default)]
pub struct BreakerRegistry {
    breakers: Arc<RwLock<HashMap<String, Arc<Breaker>>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the breaker named by `config`, creating it from `config` if
    /// this is the first reference.
    ///
    /// When a breaker with that name already exists its original settings
    /// stay in force and `config` is dropped.
    pub fn get_or_create(&self, config: CircuitBreakerConfig) -> Arc<Breaker> {
        if let Some(existing) = self.get(&config.name) {
            #[cfg(feature = "tracing")]
            debug!(breaker = %config.name, "reusing existing circuit breaker; new settings ignored");
            return existing;
        }

        let mut breakers = self
            .breakers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Another caller may have won the race between the read and write locks.
        if let Some(existing) = breakers.get(&config.name) {
            return Arc::clone(existing);
        }

        #[cfg(feature = "tracing")]
        info!(
            breaker = %config.name,
            failure_threshold = config.failure_threshold,
            recovery_timeout_ms = config.recovery_timeout.as_millis() as u64,
            half_open_max_calls = config.half_open_max_calls,
            "created circuit breaker"
        );

        let name = config.name.clone();
        let breaker = Arc::new(Breaker::new(config));
        breakers.insert(name, Arc::clone(&breaker));
        breaker
    }

    /// Layer bound to the named breaker; see [`get_or_create`](Self::get_or_create).
    pub fn layer(&self, config: CircuitBreakerConfig) -> CircuitBreakerLayer {
        CircuitBreakerLayer::new(self.get_or_create(config))
    }

    pub fn get(&self, name: &str) -> Option<Arc<Breaker>> {
        self.breakers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .breakers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.breakers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Health snapshot of every registered breaker, keyed by name.
    pub async fn health(&self) -> BTreeMap<String, CircuitHealth> {
        let breakers: Vec<Arc<Breaker>> = self
            .breakers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut snapshot = BTreeMap::new();
        for breaker in breakers {
            snapshot.insert(breaker.name().to_string(), breaker.health().await);
        }
        snapshot
    }
}

impl std::fmt::Debug for BreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerRegistry")
            .field("names", &self.names())
            .finish()
    }
}
