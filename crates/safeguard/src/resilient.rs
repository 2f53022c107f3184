//! One-stop wrapper for calls to a remote dependency.
//!
//! A [`ResilientLayer`] stacks, from the outside in:
//!
//! 1. an optional fallback that answers only when the circuit rejects a call,
//! 2. the named circuit breaker from a [`BreakerRegistry`],
//! 3. retry with capped exponential backoff around the operation.
//!
//! The breaker sees one outcome per call, after retries are exhausted, so a
//! single flaky call does not count as several failures.

use safeguard_circuitbreaker::{
    Breaker, BreakerRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError,
    CircuitBreakerLayer, ConfigError,
};
use safeguard_fallback::{Fallback, FallbackLayer, FallbackStrategy};
use safeguard_retry::{Retry, RetryLayer};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower::util::Either;
use tower::Layer;

/// Error returned by a resilient call: the circuit was open, or the operation
/// failed on every attempt.
pub type ResilientError<E> = CircuitBreakerError<E>;

/// Service produced by [`ResilientLayer`].
///
/// `Left` when a fallback is configured, `Right` otherwise.
pub type Resilient<S, Req, Res, E> = Either<
    Fallback<CircuitBreaker<Retry<S, E>>, Req, Res, ResilientError<E>>,
    CircuitBreaker<Retry<S, E>>,
>;

/// Entry point for configuring a [`ResilientLayer`].
///
/// The type only namespaces [`builder`](Self::builder); the settings live in
/// [`ResilientConfigBuilder`].
pub struct ResilientConfig<Req, Res, E> {
    _marker: std::marker::PhantomData<fn(Req) -> Result<Res, E>>,
}

impl<Req, Res, E> ResilientConfig<Req, Res, E> {
    /// Starts configuring calls to the dependency called `name`.
    ///
    /// `name` keys the breaker in the registry. Every layer built with the
    /// same name shares one breaker.
    pub fn builder(name: impl Into<String>) -> ResilientConfigBuilder<Req, Res, E> {
        ResilientConfigBuilder::new(name.into())
    }
}

/// Builder for [`ResilientLayer`].
///
/// Breaker settings only take effect when the name is seen by the registry
/// for the first time; afterwards the existing breaker is reused as is.
pub struct ResilientConfigBuilder<Req, Res, E> {
    name: String,
    max_attempts: usize,
    initial_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
    retry_predicate: Option<Arc<dyn Fn(&E) -> bool + Send + Sync>>,
    failure_threshold: u32,
    recovery_timeout: Duration,
    half_open_max_calls: u32,
    fallback: Option<FallbackStrategy<Req, Res, ResilientError<E>>>,
}

impl<Req, Res, E> ResilientConfigBuilder<Req, Res, E> {
    fn new(name: String) -> Self {
        Self {
            name,
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
            retry_predicate: None,
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 3,
            fallback: None,
        }
    }

    /// Attempts per call, including the first. Zero is treated as one.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Backoff schedule between attempts.
    ///
    /// Default: 1 second, doubling, at most 10 seconds
    pub fn retry_delays(mut self, initial: Duration, max: Duration, exponential_base: f64) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self.exponential_base = exponential_base;
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

    /// Default: 5
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Default: 30 seconds
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Default: 3
    pub fn half_open_max_calls(mut self, calls: u32) -> Self {
        self.half_open_max_calls = calls;
        self
    }

    /// Answer rejected calls with a clone of `value`.
    pub fn fallback_value(mut self, value: Res) -> Self
    where
        Res: Clone + Send + Sync + 'static,
    {
        self.fallback = Some(FallbackStrategy::value(value));
        self
    }

    /// Answer rejected calls with `f(&request)`.
    pub fn fallback_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Req) -> Res + Send + Sync + 'static,
    {
        self.fallback = Some(FallbackStrategy::from_request_error(move |req, _| f(req)));
        self
    }

    /// Answer rejected calls by awaiting `backup(request)`.
    ///
    /// An error from the backup is returned as [`CircuitBreakerError::Inner`].
    pub fn fallback_service<F, Fut>(mut self, backup: F) -> Self
    where
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
        Req: 'static,
        Res: 'static,
        E: 'static,
    {
        let backup = Arc::new(backup);
        self.fallback = Some(FallbackStrategy::service(move |req| {
            let response = backup(req);
            async move { response.await.map_err(CircuitBreakerError::Inner) }
        }));
        self
    }

    /// Resolves the breaker in `registry` and builds the layer.
    ///
    /// Fails only when the breaker settings are invalid and the name is new
    /// to the registry.
    pub fn build(self, registry: &BreakerRegistry) -> Result<ResilientLayer<Req, Res, E>, ConfigError>
    where
        E: Send + 'static,
    {
        let config = CircuitBreakerConfig::builder()
            .name(self.name.clone())
            .failure_threshold(self.failure_threshold)
            .recovery_timeout(self.recovery_timeout)
            .half_open_max_calls(self.half_open_max_calls)
            .build_config();
        let breaker = match config {
            Ok(config) => registry.get_or_create(config),
            // Settings of an existing breaker are never consulted, valid or not.
            Err(e) => registry.get(&self.name).ok_or(e)?,
        };

        let mut retry = RetryLayer::<E>::builder()
            .name(self.name.clone())
            .max_attempts(self.max_attempts)
            .initial_delay(self.initial_delay)
            .max_delay(self.max_delay)
            .exponential_base(self.exponential_base);
        if let Some(predicate) = self.retry_predicate {
            retry = retry.retry_on(move |e: &E| predicate(e));
        }

        let fallback = self.fallback.map(|strategy| {
            FallbackLayer::builder(strategy)
                .name(self.name.clone())
                .handle(|e: &ResilientError<E>| e.is_circuit_open())
                .build()
        });

        Ok(ResilientLayer {
            retry: retry.build(),
            breaker: CircuitBreakerLayer::new(breaker),
            fallback,
        })
    }
}

/// Tower layer applying fallback, circuit breaker and retry to a service.
///
/// Cloning is cheap; clones share the breaker and configuration.
pub struct ResilientLayer<Req, Res, E> {
    retry: RetryLayer<E>,
    breaker: CircuitBreakerLayer,
    fallback: Option<FallbackLayer<Req, Res, ResilientError<E>>>,
}

impl<Req, Res, E> ResilientLayer<Req, Res, E> {
    /// The shared breaker guarding this dependency.
    pub fn breaker(&self) -> &Arc<Breaker> {
        self.breaker.breaker()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl<Req, Res, E> Clone for ResilientLayer<Req, Res, E> {
    fn clone(&self) -> Self {
        Self {
            retry: self.retry.clone(),
            breaker: self.breaker.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<S, Req, Res, E> Layer<S> for ResilientLayer<Req, Res, E> {
    type Service = Resilient<S, Req, Res, E>;

    fn layer(&self, service: S) -> Self::Service {
        let guarded = self.breaker.layer(self.retry.layer(service));
        match &self.fallback {
            Some(fallback) => Either::Left(fallback.layer(guarded)),
            None => Either::Right(guarded),
        }
    }
}
