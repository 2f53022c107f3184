//! Cache metrics regression tests

use super::helpers::*;
use safeguard_cache::{CacheStore, MemoryBackend};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn cache_metrics_exist() {
    init_recorder();

    let cache = CacheStore::with_backend(MemoryBackend::new(), None).await;
    cache.set("present", &1u32, None).await;
    let _ = cache.get::<u32>("present").await;
    let _ = cache.get::<u32>("absent").await;

    assert_counter_exists("cache_requests_total");
    assert_metric_has_label("cache_requests_total", "result", "hit");
    assert_metric_has_label("cache_requests_total", "result", "miss");
}
