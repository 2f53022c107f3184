use safeguard_circuitbreaker::{Breaker, BreakerRegistry, CircuitBreakerConfig, CircuitState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Layer, ServiceExt};

/// Only `half_open_max_calls` of many simultaneous callers become trials.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_respect_half_open_limit() {
    let breaker = Arc::new(Breaker::new(
        CircuitBreakerConfig::builder()
            .name("concurrent-halfopen")
            .failure_threshold(1)
            .recovery_timeout(Duration::from_millis(20))
            .half_open_max_calls(3)
            .build_config()
            .unwrap(),
    ));

    assert!(breaker.try_acquire().await);
    breaker.record_failure().await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let breaker = Arc::clone(&breaker);
        handles.push(tokio::spawn(async move { breaker.try_acquire().await }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 3);
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);
}

/// Failures from many tasks are all counted; none are lost to races.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_are_all_recorded() {
    let registry = BreakerRegistry::new();
    let breaker = registry.get_or_create(
        CircuitBreakerConfig::builder()
            .name("counting")
            .failure_threshold(1_000)
            .build_config()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..50 {
        let breaker = Arc::clone(&breaker);
        handles.push(tokio::spawn(async move {
            if breaker.try_acquire().await {
                breaker.record_failure().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(breaker.health().await.failure_count, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registry_creation_race_yields_one_breaker() {
    let registry = BreakerRegistry::new();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry.get_or_create(
                CircuitBreakerConfig::builder()
                    .name("shared")
                    .build_config()
                    .unwrap(),
            )
        }));
    }

    let mut breakers = Vec::new();
    for handle in handles {
        breakers.push(handle.await.unwrap());
    }

    assert_eq!(registry.len(), 1);
    assert!(breakers.iter().all(|b| Arc::ptr_eq(b, &breakers[0])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cloned_services_trip_one_circuit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);

    let layer = BreakerRegistry::new().layer(
        CircuitBreakerConfig::builder()
            .name("fanout")
            .failure_threshold(5)
            .recovery_timeout(Duration::from_secs(60))
            .build_config()
            .unwrap(),
    );
    let svc = layer.layer(service_fn(move |_: ()| {
        c.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>("down") }
    }));

    let mut handles = Vec::new();
    for _ in 0..5 {
        let svc = svc.clone();
        handles.push(tokio::spawn(svc.oneshot(())));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_err());
    }

    assert!(svc.is_open());
    let err = svc.clone().oneshot(()).await.unwrap_err();
    assert!(err.is_circuit_open());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}
