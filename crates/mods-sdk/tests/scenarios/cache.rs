use crate::client_with_pages;
use mods_sdk::{CacheBackend, Config, QueryCache};
use mods_testing::{CallBuilder, StubStore, obj_uri};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn store() -> Arc<StubStore> {
    Arc::new(
        StubStore::new()
            .with_calls((0..7).map(|i| CallBuilder::new(&format!("c{}", i)).build()))
            .with_ref(&obj_uri("a", "b"), json!({"x": 1})),
    )
}

#[test]
fn test_cached_calls_skip_the_backend() {
    let store = store();
    let client = client_with_pages(&store, 5);
    let cache = QueryCache::memory();

    let first = client.calls().limit(100).fetch_cached(&cache).unwrap();
    let requests = store.page_requests();
    let second = client.calls().limit(100).fetch_cached(&cache).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.page_requests(), requests);

    // Different parameters are a different key
    client.calls().limit(3).fetch_cached(&cache).unwrap();
    assert!(store.page_requests() > requests);
}

#[test]
fn test_invalidate_forces_refetch() {
    let store = store();
    let client = client_with_pages(&store, 5);
    let cache = QueryCache::memory();

    client.calls().fetch_cached(&cache).unwrap();
    let requests = store.page_requests();

    cache.invalidate(&client.calls().cache_key().unwrap()).unwrap();
    client.calls().fetch_cached(&cache).unwrap();

    assert_eq!(store.page_requests(), requests * 2);
}

#[test]
fn test_disk_cache_shared_across_instances() {
    let temp = TempDir::new().unwrap();
    let store = store();
    let client = client_with_pages(&store, 5);
    let refs = [obj_uri("a", "b")];

    let first = client
        .resolve_refs_cached(&refs, &QueryCache::disk(temp.path()).unwrap())
        .unwrap();
    let second = client
        .resolve_refs_cached(&refs, &QueryCache::disk(temp.path()).unwrap())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.refs_requests().len(), 1);
}

#[test]
fn test_cache_from_config() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    assert!(QueryCache::from_config(&config).unwrap().is_some());

    config.cache.backend = CacheBackend::None;
    assert!(QueryCache::from_config(&config).unwrap().is_none());

    config.cache.backend = CacheBackend::Disk;
    config.cache.dir = Some(temp.path().join("cache"));
    assert!(QueryCache::from_config(&config).unwrap().is_some());
    assert!(temp.path().join("cache").is_dir());
}
