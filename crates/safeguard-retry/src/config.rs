use crate::backoff::{ExponentialBackoff, IntervalFunction};
use crate::events::RetryEvent;
use crate::policy::{RetryPolicy, RetryPredicate};
use crate::RetryLayer;
use safeguard_core::{EventListeners, FnListener};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the retry middleware.
pub struct RetryConfig<E> {
    pub(crate) policy: RetryPolicy<E>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl<E> RetryConfig<E> {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`RetryLayer`].
///
/// Unless [`backoff`](Self::backoff) installs a custom strategy, pauses grow
/// exponentially from `initial_delay` by `exponential_base` and are capped at
/// `max_delay`.
pub struct RetryConfigBuilder<E> {
    max_attempts: usize,
    initial_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl<E> Default for RetryConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryConfigBuilder<E> {
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
            interval_fn: None,
            retry_predicate: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Total attempts including the first call. Zero is treated as one.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Pause after the first failure.
    ///
    /// Default: 1 second
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Upper bound on a single pause.
    ///
    /// Default: 10 seconds
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Factor applied to the pause after every retry.
    ///
    /// Default: 2.0
    pub fn exponential_base(mut self, base: f64) -> Self {
        self.exponential_base = base;
        self
    }

    /// Replaces the exponential schedule with a custom strategy.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Only retry errors for which `predicate` returns true.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Called with the retry number (1-based) and the pause before it.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Called with the number of attempts it took to succeed.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Called with the number of attempts made when all of them failed.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, RetryEvent::IgnoredError { .. }) {
                f();
            }
        }));
        self
    }

    /// Builds the configuration without wrapping it in a layer.
    pub fn build_config(self) -> RetryConfig<E> {
        let interval_fn = self.interval_fn.unwrap_or_else(|| {
            Arc::new(
                ExponentialBackoff::new(self.initial_delay)
                    .multiplier(self.exponential_base)
                    .max_interval(self.max_delay),
            )
        });

        let mut policy = RetryPolicy::new(self.max_attempts, interval_fn);
        policy.retry_predicate = self.retry_predicate;

        RetryConfig {
            policy,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    pub fn build(self) -> RetryLayer<E> {
        RetryLayer::new(self.build_config())
    }
}
