use std::time::Duration;
use tracing::warn;

/// Environment variable holding the cache server URL.
pub const REDIS_URL_ENV: &str = "REDIS_URL";
/// Environment variable overriding the connect timeout, in whole seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "REDIS_CONNECT_TIMEOUT_SECS";
/// Environment variable overriding the per-operation timeout, in whole seconds.
pub const OPERATION_TIMEOUT_ENV: &str = "REDIS_OPERATION_TIMEOUT_SECS";

/// Connection settings for [`CacheStore::connect`](crate::CacheStore::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Server URL, e.g. `redis://cache:6379/0`. `None` means run without a cache.
    pub url: Option<String>,
    /// Bound on client creation plus the initial PING.
    pub connect_timeout: Duration,
    /// Bound on every backend round trip after connecting. A call that runs
    /// past it is reported as a timeout and answered with the safe default.
    pub operation_timeout: Duration,
    /// TTL used by `set` when the caller passes none.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(5),
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Reads `REDIS_URL`, `REDIS_CONNECT_TIMEOUT_SECS` and
    /// `REDIS_OPERATION_TIMEOUT_SECS`.
    ///
    /// An empty URL counts as unset. An unparsable timeout is logged and the
    /// default is kept.
    pub fn from_env() -> Self {
        let url = std::env::var(REDIS_URL_ENV)
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let mut config = Self {
            url,
            ..Self::default()
        };

        read_secs(CONNECT_TIMEOUT_ENV, &mut config.connect_timeout);
        read_secs(OPERATION_TIMEOUT_ENV, &mut config.operation_timeout);

        config
    }
}

fn read_secs(var: &str, target: &mut Duration) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) => *target = Duration::from_secs(secs),
        Err(_) => warn!(value = %raw, "ignoring invalid {}; using {:?}", var, target),
    }
}
