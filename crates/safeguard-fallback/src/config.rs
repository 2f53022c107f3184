//! Configuration for the fallback service.

use crate::{FallbackEvent, FallbackLayer, FallbackStrategy, HandlePredicate};
use safeguard_core::{EventListeners, FnListener};
use std::sync::Arc;

/// Configuration for the fallback service.
pub struct FallbackConfig<Req, Res, E> {
    pub(crate) name: String,
    pub(crate) strategy: FallbackStrategy<Req, Res, E>,
    pub(crate) handle_predicate: Option<HandlePredicate<E>>,
    pub(crate) event_listeners: EventListeners<FallbackEvent>,
}

/// Builder for a [`FallbackLayer`]. Created by [`FallbackLayer::builder`].
pub struct FallbackConfigBuilder<Req, Res, E> {
    name: String,
    strategy: FallbackStrategy<Req, Res, E>,
    handle_predicate: Option<HandlePredicate<E>>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl<Req, Res, E> FallbackConfigBuilder<Req, Res, E> {
    pub(crate) fn new(strategy: FallbackStrategy<Req, Res, E>) -> Self {
        Self {
            name: "<unnamed>".to_string(),
            strategy,
            handle_predicate: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name used in metrics and events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Only trigger the fallback for errors matching this predicate.
    ///
    /// Errors that don't match are propagated as-is.
    pub fn handle<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.handle_predicate = Some(Arc::new(predicate));
        self
    }

    /// Adds an event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&FallbackEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    /// Called with the strategy name whenever the fallback answers.
    pub fn on_applied<F>(mut self, f: F) -> Self
    where
        F: Fn(&'static str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Applied { strategy, .. } = event {
                f(strategy);
            }
        }));
        self
    }

    pub fn build(self) -> FallbackLayer<Req, Res, E> {
        FallbackLayer::new(FallbackConfig {
            name: self.name,
            strategy: self.strategy,
            handle_predicate: self.handle_predicate,
            event_listeners: self.event_listeners,
        })
    }
}
