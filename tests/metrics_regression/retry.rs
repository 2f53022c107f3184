//! Retry metrics regression tests

use super::helpers::*;
use safeguard_retry::RetryLayer;
use serial_test::serial;
use std::time::Duration;
use tower::{Layer, ServiceExt};

#[tokio::test(start_paused = true)]
#[serial]
async fn retry_metrics_exist() {
    init_recorder();

    let layer = RetryLayer::<&'static str>::builder()
        .name("metrics_retry")
        .max_attempts(3)
        .initial_delay(Duration::from_millis(10))
        .build();

    let _ = layer
        .layer(tower::service_fn(|_: u64| async { Err::<(), _>("down") }))
        .oneshot(1)
        .await;
    let _ = layer
        .layer(tower::service_fn(|_: u64| async { Ok::<_, &str>(()) }))
        .oneshot(2)
        .await;

    assert_counter_exists("retry_attempts_total");
    assert_metric_has_label("retry_attempts_total", "retry", "metrics_retry");

    assert_counter_exists("retry_calls_total");
    assert_metric_has_label("retry_calls_total", "outcome", "exhausted");
    assert_metric_has_label("retry_calls_total", "outcome", "success");
}
