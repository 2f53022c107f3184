use crate::backoff::IntervalFunction;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether an error is worth another attempt.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// How many times to try, how long to wait between tries, and which errors
/// qualify.
pub struct RetryPolicy<E> {
    pub(crate) max_attempts: usize,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
}

impl<E> RetryPolicy<E> {
    /// `max_attempts` counts the first call; zero is treated as one.
    pub fn new(max_attempts: usize, interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval_fn,
            retry_predicate: None,
        }
    }

    pub fn with_retry_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Every error is retryable unless a predicate says otherwise.
    pub fn should_retry(&self, error: &E) -> bool {
        self.retry_predicate
            .as_ref()
            .map(|predicate| predicate(error))
            .unwrap_or(true)
    }

    pub fn next_backoff(&self, retry: usize) -> Duration {
        self.interval_fn.next_interval(retry)
    }
}
