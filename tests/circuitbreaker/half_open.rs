use safeguard_circuitbreaker::{Breaker, CircuitBreakerConfig, CircuitBreakerLayer, CircuitState};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Layer, ServiceExt};

fn breaker(half_open_max_calls: u32) -> Breaker {
    Breaker::new(
        CircuitBreakerConfig::builder()
            .name("payments")
            .failure_threshold(1)
            .recovery_timeout(Duration::from_secs(1))
            .half_open_max_calls(half_open_max_calls)
            .build_config()
            .unwrap(),
    )
}

async fn trip_and_wait(breaker: &Breaker) {
    assert!(breaker.try_acquire().await);
    breaker.record_failure().await;
    assert_eq!(breaker.state().await, CircuitState::Open);
    tokio::time::advance(Duration::from_secs(1)).await;
}

/// The admission that moves Open to HalfOpen is the first trial.
#[tokio::test(start_paused = true)]
async fn transition_admission_counts_as_first_trial() {
    let breaker = breaker(2);
    trip_and_wait(&breaker).await;

    assert!(breaker.try_acquire().await);
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);
    assert!(breaker.try_acquire().await);
    assert!(!breaker.try_acquire().await);
}

#[tokio::test(start_paused = true)]
async fn closes_after_enough_trial_successes() {
    let breaker = breaker(3);
    trip_and_wait(&breaker).await;

    for _ in 0..3 {
        assert!(breaker.try_acquire().await);
    }
    breaker.record_success().await;
    breaker.record_success().await;
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);

    breaker.record_success().await;
    let health = breaker.health().await;
    assert_eq!(health.state, CircuitState::Closed);
    assert_eq!(health.failure_count, 0);
}

#[tokio::test(start_paused = true)]
async fn one_trial_failure_reopens_despite_successes() {
    let breaker = breaker(3);
    trip_and_wait(&breaker).await;

    assert!(breaker.try_acquire().await);
    assert!(breaker.try_acquire().await);
    breaker.record_success().await;
    breaker.record_failure().await;

    assert_eq!(breaker.state().await, CircuitState::Open);
    assert!(!breaker.try_acquire().await);
}

/// Trial slots are fresh on every entry into HalfOpen.
#[tokio::test(start_paused = true)]
async fn trial_budget_resets_on_each_half_open_entry() {
    let breaker = breaker(1);
    trip_and_wait(&breaker).await;

    assert!(breaker.try_acquire().await);
    assert!(!breaker.try_acquire().await);
    breaker.record_failure().await;

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(breaker.try_acquire().await);
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);
    breaker.record_success().await;
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn health_reports_degraded_while_half_open() {
    let breaker = breaker(1);
    assert_eq!(breaker.health_status(), "healthy");

    assert!(breaker.try_acquire().await);
    breaker.record_failure().await;
    assert_eq!(breaker.health_status(), "unhealthy");
    assert_eq!(breaker.http_status(), 503);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(breaker.try_acquire().await);
    assert_eq!(breaker.health_status(), "degraded");
    assert_eq!(breaker.http_status(), 200);
}

/// A trial whose caller gives up must not keep the only half-open slot.
#[tokio::test(start_paused = true)]
async fn abandoned_trial_reopens_instead_of_wedging() {
    const FAIL: u8 = 0;
    const HANG: u8 = 1;
    const OK: u8 = 2;

    let layer = CircuitBreakerLayer::builder()
        .name("payments")
        .failure_threshold(1)
        .recovery_timeout(Duration::from_secs(1))
        .half_open_max_calls(1)
        .build()
        .unwrap();
    let breaker = Arc::clone(layer.breaker());

    let mode = Arc::new(AtomicU8::new(FAIL));
    let m = Arc::clone(&mode);
    let svc = layer.layer(service_fn(move |_: ()| {
        let mode = m.load(Ordering::SeqCst);
        async move {
            match mode {
                FAIL => Err("down"),
                HANG => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
                _ => Ok(()),
            }
        }
    }));

    assert!(svc.clone().oneshot(()).await.is_err());
    assert_eq!(breaker.state().await, CircuitState::Open);
    tokio::time::advance(Duration::from_secs(1)).await;

    mode.store(HANG, Ordering::SeqCst);
    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), svc.clone().oneshot(())).await;
    assert!(abandoned.is_err());

    assert_eq!(breaker.state().await, CircuitState::Open);
    let err = svc.clone().oneshot(()).await.unwrap_err();
    assert!(err.is_circuit_open());

    mode.store(OK, Ordering::SeqCst);
    tokio::time::advance(Duration::from_secs(1)).await;
    svc.clone().oneshot(()).await.unwrap();
    assert_eq!(breaker.state().await, CircuitState::Closed);
}
