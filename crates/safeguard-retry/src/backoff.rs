//! Delay strategies between attempts.

use std::time::Duration;

/// Computes the pause before a retry.
///
/// `retry` is zero for the pause after the first failed attempt.
pub trait IntervalFunction: Send + Sync {
    fn next_interval(&self, retry: usize) -> Duration;
}

/// The same pause before every retry.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _retry: usize) -> Duration {
        self.duration
    }
}

/// `initial * multiplier^retry`, capped at `max_interval`.
///
/// Defaults: 1 s initial, multiplier 2.0, 10 s cap, giving 1 s, 2 s, 4 s, 8 s,
/// 10 s, 10 s, ...
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl ExponentialBackoff {
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: Duration::from_secs(10),
        }
    }

    /// Growth factor between consecutive pauses.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Upper bound on any single pause.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, retry: usize) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        // NaN and negative products collapse to zero
        let secs = (self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent)).max(0.0);

        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Pause computed by a closure.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, retry: usize) -> Duration {
        (self.f)(retry)
    }
}
