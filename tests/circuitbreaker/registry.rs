use safeguard_circuitbreaker::{BreakerRegistry, CircuitBreakerConfig, CircuitState};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Layer, ServiceExt};

fn config(name: &str, threshold: u32) -> CircuitBreakerConfig {
    CircuitBreakerConfig::builder()
        .name(name)
        .failure_threshold(threshold)
        .recovery_timeout(Duration::from_secs(30))
        .build_config()
        .unwrap()
}

#[tokio::test]
async fn first_reference_wins() {
    let registry = BreakerRegistry::new();

    let a = registry.get_or_create(config("geo", 2));
    let b = registry.get_or_create(config("geo", 9));

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(b.config().failure_threshold(), 2);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn layers_with_same_name_share_state() {
    let registry = BreakerRegistry::new();

    let failing = registry
        .layer(config("search", 1))
        .layer(service_fn(|_: ()| async { Err::<(), _>("down") }));
    let healthy = registry
        .layer(config("search", 1))
        .layer(service_fn(|_: ()| async { Ok::<_, &str>(()) }));

    let _ = failing.oneshot(()).await;

    let err = healthy.oneshot(()).await.unwrap_err();
    assert!(err.is_circuit_open());
}

#[tokio::test]
async fn clones_share_the_map() {
    let registry = BreakerRegistry::new();
    let handle = registry.clone();

    handle.get_or_create(config("billing", 3));

    assert!(registry.get("billing").is_some());
    assert!(registry.get("shipping").is_none());
}

#[tokio::test]
async fn health_snapshot_lists_every_breaker() {
    let registry = BreakerRegistry::new();
    let billing = registry.get_or_create(config("billing", 1));
    registry.get_or_create(config("auth", 5));
    let geo = registry.get_or_create(config("geo", 5));

    assert!(billing.try_acquire().await);
    billing.record_failure().await;
    assert!(geo.try_acquire().await);
    geo.record_failure().await;

    assert_eq!(registry.names(), vec!["auth", "billing", "geo"]);

    let health = registry.health().await;
    assert_eq!(health.len(), 3);
    assert_eq!(health["billing"].state, CircuitState::Open);
    assert!(health["billing"].last_failure.is_some());
    assert_eq!(health["auth"].state, CircuitState::Closed);
    assert_eq!(health["auth"].failure_count, 0);
    assert!(health["auth"].last_failure.is_none());
    assert_eq!(health["geo"].state, CircuitState::Closed);
    assert_eq!(health["geo"].failure_count, 1);
}

#[test]
fn health_snapshot_serializes() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let registry = BreakerRegistry::new();
        registry.get_or_create(config("billing", 1));

        let json = serde_json::to_value(registry.health().await).unwrap();
        assert_eq!(json["billing"]["state"], "closed");
        assert_eq!(json["billing"]["failure_count"], 0);
        assert!(json["billing"]["last_failure"].is_null());
    });
}
