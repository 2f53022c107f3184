//! Fallback middleware for Tower services.
//!
//! When the inner service fails with an error selected by the handle
//! predicate (every error by default), the fallback answers instead:
//!
//! - [`FallbackStrategy::value`]: a fixed response
//! - [`FallbackStrategy::from_error`]: a response computed from the error
//! - [`FallbackStrategy::from_request_error`]: computed from request and error
//! - [`FallbackStrategy::service`]: a backup async function
//!
//! The error type is the inner service's, so the layer composes over any
//! other middleware without wrapping its errors.
//!
//! ```rust
//! use safeguard_fallback::{FallbackLayer, FallbackStrategy};
//! use tower::{service_fn, ServiceBuilder, ServiceExt};
//!
//! #[derive(Debug)]
//! enum LookupError {
//!     Unavailable,
//!     NotFound,
//! }
//!
//! # async fn example() {
//! let layer = FallbackLayer::builder(FallbackStrategy::value(Vec::<String>::new()))
//!     .name("recommendations")
//!     .handle(|e: &LookupError| matches!(e, LookupError::Unavailable))
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(service_fn(|_user: u64| async { Err(LookupError::Unavailable) }));
//!
//! assert!(service.oneshot(7).await.unwrap().is_empty());
//! # }
//! ```

mod config;
mod events;
mod layer;

pub use config::{FallbackConfig, FallbackConfigBuilder};
pub use events::FallbackEvent;
pub use layer::FallbackLayer;

use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Produces a fresh fallback response.
pub type ValueFn<Res> = Arc<dyn Fn() -> Res + Send + Sync>;

/// Function that computes a fallback response from the error.
pub type FromErrorFn<Res, E> = Arc<dyn Fn(&E) -> Res + Send + Sync>;

/// Function that computes a fallback response from request and error.
pub type FromRequestErrorFn<Req, Res, E> = Arc<dyn Fn(&Req, &E) -> Res + Send + Sync>;

/// Backup async function.
pub type ServiceFn<Req, Res, E> =
    Arc<dyn Fn(Req) -> BoxFuture<'static, Result<Res, E>> + Send + Sync>;

/// Decides whether an error triggers the fallback.
pub type HandlePredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// How a fallback response is produced.
pub enum FallbackStrategy<Req, Res, E> {
    Value(ValueFn<Res>),
    FromError(FromErrorFn<Res, E>),
    FromRequestError(FromRequestErrorFn<Req, Res, E>),
    Service(ServiceFn<Req, Res, E>),
}

impl<Req, Res, E> FallbackStrategy<Req, Res, E> {
    pub fn value(value: Res) -> Self
    where
        Res: Clone + Send + Sync + 'static,
    {
        Self::Value(Arc::new(move || value.clone()))
    }

    pub fn from_error<F>(f: F) -> Self
    where
        F: Fn(&E) -> Res + Send + Sync + 'static,
    {
        Self::FromError(Arc::new(f))
    }

    pub fn from_request_error<F>(f: F) -> Self
    where
        F: Fn(&Req, &E) -> Res + Send + Sync + 'static,
    {
        Self::FromRequestError(Arc::new(f))
    }

    pub fn service<S, Fut>(service: S) -> Self
    where
        S: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Res, E>> + Send + 'static,
    {
        Self::Service(Arc::new(move |req| Box::pin(service(req))))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::FromError(_) => "from_error",
            Self::FromRequestError(_) => "from_request_error",
            Self::Service(_) => "service",
        }
    }
}

impl<Req, Res, E> Clone for FallbackStrategy<Req, Res, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(f) => Self::Value(Arc::clone(f)),
            Self::FromError(f) => Self::FromError(Arc::clone(f)),
            Self::FromRequestError(f) => Self::FromRequestError(Arc::clone(f)),
            Self::Service(s) => Self::Service(Arc::clone(s)),
        }
    }
}

/// A Tower [`Service`] that answers handled failures with a fallback.
pub struct Fallback<S, Req, Res, E> {
    inner: S,
    config: Arc<FallbackConfig<Req, Res, E>>,
}

impl<S, Req, Res, E> Fallback<S, Req, Res, E> {
    pub fn new(inner: S, config: Arc<FallbackConfig<Req, Res, E>>) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "fallback_calls_total",
                "Total number of calls through the fallback middleware"
            );
        });

        Self { inner, config }
    }
}

impl<S, Req, Res, E> Clone for Fallback<S, Req, Res, E>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req, Res, E> Service<Req> for Fallback<S, Req, Res, E>
where
    S: Service<Req, Response = Res, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Clone + Send + 'static,
    Res: Send + 'static,
    E: Send + 'static,
{
    type Response = Res;
    type Error = E;
    type Future = BoxFuture<'static, Result<Res, E>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let mut service = self.inner.clone();
        let config = Arc::clone(&self.config);
        // Only strategies that look at the request need a copy.
        let req_copy = match config.strategy {
            FallbackStrategy::FromRequestError(_) | FallbackStrategy::Service(_) => {
                Some(req.clone())
            }
            FallbackStrategy::Value(_) | FallbackStrategy::FromError(_) => None,
        };

        Box::pin(async move {
            let error = match service.call(req).await {
                Ok(response) => {
                    config.event_listeners.emit(&FallbackEvent::Success {
                        name: config.name.clone(),
                        timestamp: Instant::now(),
                    });

                    #[cfg(feature = "metrics")]
                    counter!("fallback_calls_total", "fallback" => config.name.clone(), "result" => "success").increment(1);

                    return Ok(response);
                }
                Err(error) => error,
            };

            let handled = config
                .handle_predicate
                .as_ref()
                .map(|p| p(&error))
                .unwrap_or(true);

            if !handled {
                config.event_listeners.emit(&FallbackEvent::Skipped {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                });

                #[cfg(feature = "metrics")]
                counter!("fallback_calls_total", "fallback" => config.name.clone(), "result" => "skipped").increment(1);

                return Err(error);
            }

            let strategy = config.strategy.label();

            #[cfg(feature = "tracing")]
            tracing::debug!(fallback = %config.name, strategy, "inner service failed, applying fallback");

            let response = match (&config.strategy, req_copy) {
                (FallbackStrategy::Value(f), _) => f(),
                (FallbackStrategy::FromError(f), _) => f(&error),
                (FallbackStrategy::FromRequestError(f), Some(req)) => f(&req, &error),
                (FallbackStrategy::Service(backup), Some(req)) => match backup(req).await {
                    Ok(response) => response,
                    Err(backup_error) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(fallback = %config.name, "backup service also failed");

                        #[cfg(feature = "metrics")]
                        counter!("fallback_calls_total", "fallback" => config.name.clone(), "result" => "failed").increment(1);

                        config.event_listeners.emit(&FallbackEvent::Failed {
                            name: config.name.clone(),
                            timestamp: Instant::now(),
                        });
                        return Err(backup_error);
                    }
                },
                // The request copy is taken for exactly these two strategies.
                (FallbackStrategy::FromRequestError(_), None)
                | (FallbackStrategy::Service(_), None) => return Err(error),
            };

            #[cfg(feature = "metrics")]
            counter!("fallback_calls_total", "fallback" => config.name.clone(), "result" => "applied", "strategy" => strategy).increment(1);

            config.event_listeners.emit(&FallbackEvent::Applied {
                name: config.name.clone(),
                timestamp: Instant::now(),
                strategy,
            });

            Ok(response)
        })
    }
}
