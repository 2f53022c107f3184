use safeguard_cache::{CacheConfig, CONNECT_TIMEOUT_ENV, OPERATION_TIMEOUT_ENV, REDIS_URL_ENV};
use serial_test::serial;
use std::time::Duration;

fn clear_env() {
    std::env::remove_var(REDIS_URL_ENV);
    std::env::remove_var(CONNECT_TIMEOUT_ENV);
    std::env::remove_var(OPERATION_TIMEOUT_ENV);
}

#[test]
#[serial]
fn unset_url_means_no_cache() {
    clear_env();
    let config = CacheConfig::from_env();
    assert_eq!(config, CacheConfig::default());
    assert!(config.url.is_none());
}

#[test]
#[serial]
fn reads_url_and_timeout() {
    clear_env();
    std::env::set_var(REDIS_URL_ENV, "redis://cache:6379/2");
    std::env::set_var(CONNECT_TIMEOUT_ENV, "2");
    std::env::set_var(OPERATION_TIMEOUT_ENV, "1");

    let config = CacheConfig::from_env();
    assert_eq!(config.url.as_deref(), Some("redis://cache:6379/2"));
    assert_eq!(config.connect_timeout, Duration::from_secs(2));
    assert_eq!(config.operation_timeout, Duration::from_secs(1));
    assert_eq!(config.default_ttl, Duration::from_secs(300));

    clear_env();
}

#[test]
#[serial]
fn blank_url_counts_as_unset() {
    clear_env();
    std::env::set_var(REDIS_URL_ENV, "   ");
    assert!(CacheConfig::from_env().url.is_none());
    clear_env();
}

#[test]
#[serial]
fn invalid_timeout_keeps_default() {
    clear_env();
    std::env::set_var(CONNECT_TIMEOUT_ENV, "soon");
    std::env::set_var(OPERATION_TIMEOUT_ENV, "-1");
    let config = CacheConfig::from_env();
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.operation_timeout, Duration::from_secs(5));
    clear_env();
}

#[test]
fn builder_style_overrides() {
    let config = CacheConfig::new("redis://localhost")
        .connect_timeout(Duration::from_millis(500))
        .operation_timeout(Duration::from_millis(250))
        .default_ttl(Duration::from_secs(60));
    assert_eq!(config.url.as_deref(), Some("redis://localhost"));
    assert_eq!(config.connect_timeout, Duration::from_millis(500));
    assert_eq!(config.operation_timeout, Duration::from_millis(250));
    assert_eq!(config.default_ttl, Duration::from_secs(60));
}
