//! Retry middleware for Tower services.
//!
//! Failed calls are retried up to `max_attempts` times in total. Between
//! attempts the middleware sleeps on the tokio timer, so dropping the response
//! future cancels any pending retry. When every attempt fails the error of the
//! last one is returned unchanged.
//!
//! ```
//! use safeguard_retry::RetryConfig;
//! use tower::ServiceBuilder;
//! use std::time::Duration;
//!
//! # #[derive(Debug)]
//! # struct MyError;
//! # async fn example() {
//! let retry = RetryConfig::<MyError>::builder()
//!     .name("profile-lookup")
//!     .max_attempts(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .on_retry(|attempt, delay| println!("retry {attempt} in {delay:?}"))
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(retry)
//!     .service(tower::service_fn(|id: u32| async move { Ok::<_, MyError>(id) }));
//! # let _ = service;
//! # }
//! ```

mod backoff;
mod config;
mod events;
mod layer;
mod policy;

pub use backoff::{ExponentialBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use policy::{RetryPolicy, RetryPredicate};

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

/// A Tower [`Service`] that retries failed requests.
///
/// Requests are cloned for every attempt.
pub struct Retry<S, E> {
    inner: S,
    config: Arc<RetryConfig<E>>,
}

impl<S, E> Retry<S, E> {
    pub fn new(inner: S, config: Arc<RetryConfig<E>>) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!("retry_attempts_total", "Retries performed after a failed attempt");
            describe_counter!("retry_calls_total", "Calls completed through the retry middleware");
        });

        Self { inner, config }
    }
}

impl<S, E> Clone for Retry<S, E>
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

impl<S, Req, E> Service<Req> for Retry<S, E>
where
    S: Service<Req, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    Req: Clone + Send + 'static,
    E: Send + 'static,
{
    type Response = S::Response;
    type Error = E;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let mut service = self.inner.clone();
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let mut attempt = 0;

            loop {
                let error = match service.call(req.clone()).await {
                    Ok(response) => {
                        config.event_listeners.emit(&RetryEvent::Success {
                            name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt + 1,
                        });

                        #[cfg(feature = "metrics")]
                        counter!("retry_calls_total", "retry" => config.name.clone(), "outcome" => "success").increment(1);

                        return Ok(response);
                    }
                    Err(error) => error,
                };

                if !config.policy.should_retry(&error) {
                    config.event_listeners.emit(&RetryEvent::IgnoredError {
                        name: config.name.clone(),
                        timestamp: Instant::now(),
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => config.name.clone(), "outcome" => "ignored").increment(1);

                    return Err(error);
                }

                if attempt + 1 >= config.policy.max_attempts {
                    config.event_listeners.emit(&RetryEvent::Exhausted {
                        name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });

                    #[cfg(feature = "tracing")]
                    tracing::warn!(retry = %config.name, attempts = attempt + 1, "retries exhausted");

                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => config.name.clone(), "outcome" => "exhausted").increment(1);

                    return Err(error);
                }

                let delay = config.policy.next_backoff(attempt);
                config.event_listeners.emit(&RetryEvent::Retry {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt: attempt + 1,
                    delay,
                });

                #[cfg(feature = "tracing")]
                tracing::debug!(retry = %config.name, attempt = attempt + 1, ?delay, "attempt failed, retrying");

                #[cfg(feature = "metrics")]
                counter!("retry_attempts_total", "retry" => config.name.clone()).increment(1);

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        })
    }
}
