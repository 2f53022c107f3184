//! Event listeners for resilience patterns.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by a resilience pattern instance.
pub trait ResilienceEvent: Send + Sync + fmt::Debug {
    /// Short machine-friendly kind, e.g. `"state_transition"` or `"retry"`.
    fn event_type(&self) -> &'static str;

    /// When the event happened.
    fn timestamp(&self) -> Instant;

    /// Name of the instance (breaker, retry policy, fallback) that emitted it.
    fn source(&self) -> &str;
}

/// Receives events of type `E`.
pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    /// Called synchronously on the emitting task.
    fn on_event(&self, event: &E);
}

/// An ordered set of listeners for one event type.
///
/// Cloning is cheap; listeners are shared.
pub struct EventListeners<E: ResilienceEvent> {
    listeners: Vec<Arc<dyn EventListener<E>>>,
}

impl<E: ResilienceEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E: ResilienceEvent> EventListeners<E> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Adds a closure that only fires for events matching `filter`.
    ///
    /// Builders use this to turn `on_xxx(|..| ..)` callbacks into listeners.
    pub fn add_filtered<P, F>(&mut self, filter: P, f: F)
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
        F: Fn(&E) + Send + Sync + 'static,
        E: 'static,
    {
        self.add(FnListener::new(move |event: &E| {
            if filter(event) {
                f(event);
            }
        }));
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// A panicking listener does not stop delivery to the ones after it.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            #[cfg(feature = "tracing")]
            if outcome.is_err() {
                tracing::warn!(
                    source = event.source(),
                    event = event.event_type(),
                    "event listener panicked"
                );
            }
            #[cfg(not(feature = "tracing"))]
            let _ = outcome;
        }
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ResilienceEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Adapts a closure into an [`EventListener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _event: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ResilienceEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
