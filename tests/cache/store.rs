use safeguard_cache::{make_key, CacheStore, MemoryBackend};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Listing {
    id: u64,
    title: String,
    rent_cents: u32,
    tags: Vec<String>,
}

fn listing() -> Listing {
    Listing {
        id: 42,
        title: "Loft near the river".to_string(),
        rent_cents: 185_000,
        tags: vec!["pets".to_string(), "parking".to_string()],
    }
}

async fn store() -> CacheStore {
    CacheStore::with_backend(MemoryBackend::new(), Some(Duration::from_secs(300))).await
}

#[tokio::test]
async fn structured_values_survive_the_cache() {
    let cache = store().await;
    let key = make_key("listing", &[json!(42)], &Map::new());

    assert!(cache.set(&key, &listing(), None).await);
    assert_eq!(cache.get::<Listing>(&key).await, Some(listing()));
}

#[tokio::test]
async fn delete_makes_key_absent() {
    let cache = store().await;
    cache.set("listing:42", &listing(), None).await;

    assert!(cache.delete("listing:42").await);
    assert_eq!(cache.get::<Listing>("listing:42").await, None);
}

#[tokio::test]
async fn deleting_absent_key_succeeds() {
    let cache = store().await;
    assert!(cache.delete("never-set").await);
}

#[tokio::test]
async fn overwrite_replaces_value() {
    let cache = store().await;
    cache.set("counter", &1u32, None).await;
    cache.set("counter", &2u32, None).await;
    assert_eq!(cache.get::<u32>("counter").await, Some(2));
}

#[tokio::test]
async fn wrong_type_reads_as_miss() {
    let cache = store().await;
    cache.set("listing:1", &listing(), None).await;
    assert_eq!(cache.get::<Vec<u8>>("listing:1").await, None);
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_their_ttl() {
    let cache = store().await;
    cache
        .set("session", &"token", Some(Duration::from_secs(60)))
        .await;

    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(cache.get::<String>("session").await.as_deref(), Some("token"));

    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(cache.get::<String>("session").await, None);
}

#[tokio::test]
async fn invalidate_pattern_removes_only_matches() {
    let cache = store().await;
    for id in 1..=4 {
        cache.set(&format!("listing:{id}"), &id, None).await;
    }
    cache.set("user:1", &"ana", None).await;

    assert_eq!(cache.invalidate_pattern("listing:*").await, 4);
    assert_eq!(cache.invalidate_pattern("listing:*").await, 0);
    assert_eq!(cache.get::<String>("user:1").await.as_deref(), Some("ana"));
}

#[tokio::test]
async fn cache_aside_skips_loader_on_hit() {
    let cache = store().await;
    let key = make_key("listing", &[json!(42)], &Map::new());
    let loads = AtomicUsize::new(0);

    for _ in 0..2 {
        let value = cache
            .get_or_insert_with(&key, None, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Some(listing())
            })
            .await;
        assert_eq!(value, Some(listing()));
    }

    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clones_share_one_backend() {
    let cache = store().await;
    let other = cache.clone();

    cache.set("shared", &true, None).await;
    assert_eq!(other.get::<bool>("shared").await, Some(true));
    assert_eq!(other.provider_name(), "memory");
}

#[tokio::test(start_paused = true)]
async fn unbounded_ttl_is_kept_not_rejected() {
    let cache = store().await;
    assert!(cache.set("pinned", &listing(), Some(Duration::MAX)).await);

    tokio::time::advance(Duration::from_secs(24 * 3600)).await;
    assert_eq!(cache.get::<Listing>("pinned").await, Some(listing()));
}
