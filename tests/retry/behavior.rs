use super::{flaky, TestError};
use safeguard_retry::RetryLayer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{Layer, ServiceExt};

fn layer(max_attempts: usize) -> RetryLayer<TestError> {
    RetryLayer::<TestError>::builder()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(10))
        .build()
}

#[tokio::test(start_paused = true)]
async fn fail_fail_succeed_takes_three_calls() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = layer(3).layer(flaky(2, Arc::clone(&calls)));

    assert_eq!(svc.oneshot("req").await.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn always_failing_returns_last_error_unchanged() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = layer(3).layer(flaky(usize::MAX, Arc::clone(&calls)));

    assert_eq!(svc.oneshot("req").await.unwrap_err(), TestError(2));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn first_success_is_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = layer(5).layer(flaky(0, Arc::clone(&calls)));

    assert_eq!(svc.oneshot("req").await.unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_behaves_like_one() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = layer(0).layer(flaky(usize::MAX, Arc::clone(&calls)));

    assert_eq!(svc.oneshot("req").await.unwrap_err(), TestError(0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn each_call_gets_a_fresh_budget() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = layer(2).layer(flaky(3, Arc::clone(&calls)));

    assert_eq!(svc.clone().oneshot("a").await.unwrap_err(), TestError(1));
    assert_eq!(svc.oneshot("b").await.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_call_cancels_pending_retries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = RetryLayer::<TestError>::builder()
        .max_attempts(10)
        .initial_delay(Duration::from_secs(5))
        .build()
        .layer(flaky(usize::MAX, Arc::clone(&calls)));

    let result = tokio::time::timeout(Duration::from_secs(7), svc.oneshot("req")).await;
    assert!(result.is_err());

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
