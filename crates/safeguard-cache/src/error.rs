use thiserror::Error;

/// Failure of a single backend operation.
///
/// These never escape [`CacheStore`](crate::CacheStore); they are logged and
/// turned into a miss, `false` or `0`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("cache connection error: {0}")]
    Connection(String),

    /// A value could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(String),

    /// The backend did not answer in time.
    #[error("cache operation timed out: {0}")]
    Timeout(String),

    /// The backend answered with an error.
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Connection(_) => "connection",
            CacheError::Serialization(_) => "serialization",
            CacheError::Timeout(_) => "timeout",
            CacheError::Backend(_) => "backend",
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Result type for backend operations.
pub type CacheResult<T> = Result<T, CacheError>;
