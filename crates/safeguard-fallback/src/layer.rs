//! Tower layer for fallback.

use crate::config::{FallbackConfig, FallbackConfigBuilder};
use crate::{Fallback, FallbackStrategy};
use std::sync::Arc;
use tower::layer::Layer;

/// A Tower layer that applies fallback behavior to a service.
///
/// See the [crate documentation](crate) for usage examples.
pub struct FallbackLayer<Req, Res, E> {
    config: Arc<FallbackConfig<Req, Res, E>>,
}

impl<Req, Res, E> FallbackLayer<Req, Res, E> {
    pub(crate) fn new(config: FallbackConfig<Req, Res, E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Starts configuring a layer around `strategy`.
    pub fn builder(strategy: FallbackStrategy<Req, Res, E>) -> FallbackConfigBuilder<Req, Res, E> {
        FallbackConfigBuilder::new(strategy)
    }

    /// Answers every handled failure with a clone of `value`.
    ///
    /// ```rust
    /// use safeguard_fallback::FallbackLayer;
    ///
    /// # #[derive(Debug)]
    /// # struct MyError;
    /// let layer = FallbackLayer::<String, String, MyError>::value("default".to_string());
    /// ```
    pub fn value(value: Res) -> Self
    where
        Res: Clone + Send + Sync + 'static,
    {
        Self::builder(FallbackStrategy::value(value)).build()
    }

    /// Computes the response from the error.
    pub fn from_error<F>(f: F) -> Self
    where
        F: Fn(&E) -> Res + Send + Sync + 'static,
    {
        Self::builder(FallbackStrategy::from_error(f)).build()
    }

    /// Computes the response from the request and the error.
    ///
    /// ```rust
    /// use safeguard_fallback::FallbackLayer;
    ///
    /// # #[derive(Debug)]
    /// # struct MyError;
    /// let layer = FallbackLayer::<u64, String, MyError>::from_request_error(|id, _err| {
    ///     format!("listing {id} unavailable")
    /// });
    /// ```
    pub fn from_request_error<F>(f: F) -> Self
    where
        F: Fn(&Req, &E) -> Res + Send + Sync + 'static,
    {
        Self::builder(FallbackStrategy::from_request_error(f)).build()
    }

    /// Routes handled failures to a backup async function.
    pub fn service<S, Fut>(service: S) -> Self
    where
        S: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Res, E>> + Send + 'static,
    {
        Self::builder(FallbackStrategy::service(service)).build()
    }
}

impl<Req, Res, E> Clone for FallbackLayer<Req, Res, E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req, Res, E> Layer<S> for FallbackLayer<Req, Res, E> {
    type Service = Fallback<S, Req, Res, E>;

    fn layer(&self, service: S) -> Self::Service {
        Fallback::new(service, Arc::clone(&self.config))
    }
}
