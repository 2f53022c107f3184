//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - Opens exactly when consecutive failures reach the threshold
//! - A success wipes the failure streak
//! - Half-open never admits more than its trial budget

use proptest::prelude::*;
use safeguard_circuitbreaker::{Breaker, CircuitBreakerConfig, CircuitState};
use std::time::Duration;
use tokio::runtime::Runtime;

fn breaker(threshold: u32, half_open: u32) -> Breaker {
    Breaker::new(
        CircuitBreakerConfig::builder()
            .name("prop")
            .failure_threshold(threshold)
            .recovery_timeout(Duration::from_millis(10))
            .half_open_max_calls(half_open)
            .build_config()
            .unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: the circuit opens on the threshold-th consecutive failure, not before
    #[test]
    fn opens_exactly_at_threshold(threshold in 1u32..=20, failures in 0u32..=40) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let breaker = breaker(threshold, 1);

            let mut admitted = 0;
            for _ in 0..failures {
                if breaker.try_acquire().await {
                    admitted += 1;
                    breaker.record_failure().await;
                }
            }

            let expected = if failures >= threshold {
                CircuitState::Open
            } else {
                CircuitState::Closed
            };
            prop_assert_eq!(breaker.state().await, expected);
            prop_assert_eq!(admitted, failures.min(threshold));

            Ok(())
        })?;
    }

    /// Property: any pattern of outcomes that never has `threshold` failures
    /// in a row keeps the circuit closed
    #[test]
    fn success_resets_the_streak(
        threshold in 2u32..=10,
        outcomes in prop::collection::vec(any::<bool>(), 0..100),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let breaker = breaker(threshold, 1);
            let mut streak = 0u32;
            let mut tripped = false;

            for ok in outcomes {
                if !breaker.try_acquire().await {
                    break;
                }
                if ok {
                    streak = 0;
                    breaker.record_success().await;
                } else {
                    streak += 1;
                    breaker.record_failure().await;
                }
                if streak >= threshold {
                    tripped = true;
                    break;
                }
                prop_assert_eq!(breaker.health().await.failure_count, streak);
            }

            let expected = if tripped { CircuitState::Open } else { CircuitState::Closed };
            prop_assert_eq!(breaker.state().await, expected);

            Ok(())
        })?;
    }

    /// Property: at most `half_open_max_calls` trials are admitted per recovery
    #[test]
    fn half_open_respects_budget(budget in 1u32..=5, callers in 1u32..=20) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let breaker = breaker(1, budget);
            breaker.try_acquire().await;
            breaker.record_failure().await;
            tokio::time::sleep(Duration::from_millis(20)).await;

            let mut admitted = 0;
            for _ in 0..callers {
                if breaker.try_acquire().await {
                    admitted += 1;
                }
            }

            prop_assert_eq!(admitted, callers.min(budget));
            prop_assert_eq!(breaker.state().await, CircuitState::HalfOpen);

            Ok(())
        })?;
    }
}
