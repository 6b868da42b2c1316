//! Explicit result cache for adapter queries.
//!
//! Keys are a SHA-256 over a namespace, the client's project id, and the
//! JSON-serialized query parameters. Values are stored as JSON so any
//! serializable result (`Calls`, `Table`) fits in every backend.
//!
//! [`QueryCache`] adds single-flight on top of a [`CacheStore`]: while one
//! caller computes a key, others asking for the same key wait for it and then
//! read the stored result.

use crate::config::{CacheBackend, Config};
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new<P: Serialize + ?Sized>(namespace: &str, project_id: &str, params: &P) -> Result<Self> {
        let params = serde_json::to_string(params)
            .map_err(|e| Error::Cache(format!("cannot serialize cache key: {}", e)))?;

        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0]);
        hasher.update(project_id.as_bytes());
        hasher.update([0]);
        hasher.update(params.as_bytes());
        let digest = hasher.finalize();

        Ok(Self(digest.iter().map(|b| format!("{:02x}", b)).collect()))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Backing storage for cached results.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<Value>>;
    fn put(&self, key: &CacheKey, value: &Value) -> Result<()>;
    fn remove(&self, key: &CacheKey) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Cache("cache lock poisoned".to_string()))
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Value>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn put(&self, key: &CacheKey, value: &Value) -> Result<()> {
        lock(&self.entries)?.insert(key.clone(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<()> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        lock(&self.entries)?.clear();
        Ok(())
    }
}

/// One JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl CacheStore for DiskCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "discarding unreadable cache entry");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    fn put(&self, key: &CacheKey, value: &Value) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec(value)
            .map_err(|e| Error::Cache(format!("cannot serialize cache entry: {}", e)))?;
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// Single-flight cache front.
pub struct QueryCache {
    store: Box<dyn CacheStore>,
    in_flight: Mutex<HashSet<CacheKey>>,
    done: Condvar,
}

/// Releases an in-flight claim even if the computation panics.
struct Claim<'c> {
    cache: &'c QueryCache,
    key: CacheKey,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.cache.in_flight.lock() {
            in_flight.remove(&self.key);
        }
        self.cache.done.notify_all();
    }
}

impl QueryCache {
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            in_flight: Mutex::new(HashSet::new()),
            done: Condvar::new(),
        }
    }

    pub fn memory() -> Self {
        Self::new(MemoryCache::new())
    }

    pub fn disk(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(DiskCache::new(dir)?))
    }

    /// Cache selected by `config.cache`; `None` when caching is disabled.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        match config.cache.backend {
            CacheBackend::None => Ok(None),
            CacheBackend::Memory => Ok(Some(Self::memory())),
            CacheBackend::Disk => Ok(Some(Self::disk(config.cache_dir()?)?)),
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::Cache(format!("cached value has wrong shape: {}", e))),
            None => Ok(None),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// Errors from `compute` are returned and not cached.
    pub fn get_or_compute<T, F>(&self, key: &CacheKey, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let _claim = loop {
            if let Some(hit) = self.read(key)? {
                tracing::debug!(key = key.as_str(), "cache hit");
                return Ok(hit);
            }

            let mut in_flight = lock(&self.in_flight)?;
            if in_flight.contains(key) {
                while in_flight.contains(key) {
                    in_flight = self
                        .done
                        .wait(in_flight)
                        .map_err(|_| Error::Cache("cache lock poisoned".to_string()))?;
                }
                continue;
            }
            in_flight.insert(key.clone());
            break Claim {
                cache: self,
                key: key.clone(),
            };
        };

        // Another caller may have stored the value between our miss and the claim.
        if let Some(hit) = self.read(key)? {
            tracing::debug!(key = key.as_str(), "cache hit");
            return Ok(hit);
        }

        tracing::debug!(key = key.as_str(), "cache miss");
        let value = compute()?;
        let json = serde_json::to_value(&value)
            .map_err(|e| Error::Cache(format!("cannot serialize result: {}", e)))?;
        self.store.put(key, &json)?;
        Ok(value)
    }

    pub fn invalidate(&self, key: &CacheKey) -> Result<()> {
        self.store.remove(key)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn key(n: u32) -> CacheKey {
        CacheKey::new("test", "ent/proj", &json!({"n": n})).unwrap()
    }

    #[test]
    fn test_key_depends_on_every_component() {
        let params = json!({"limit": 5});
        let base = CacheKey::new("calls", "ent/proj", &params).unwrap();
        assert_eq!(base, CacheKey::new("calls", "ent/proj", &params).unwrap());
        assert_ne!(base, CacheKey::new("refs", "ent/proj", &params).unwrap());
        assert_ne!(base, CacheKey::new("calls", "ent/other", &params).unwrap());
        assert_ne!(base, CacheKey::new("calls", "ent/proj", &json!({"limit": 6})).unwrap());
        assert_eq!(base.as_str().len(), 64);
    }

    #[test]
    fn test_compute_once_then_hit() {
        let cache = QueryCache::memory();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let v: u32 = cache
                .get_or_compute(&key(1), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .unwrap();
            assert_eq!(v, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate(&key(1)).unwrap();
        let _: u32 = cache.get_or_compute(&key(1), || Ok(7)).unwrap();
        let v: u32 = cache.get_or_compute(&key(1), || Ok(8)).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = QueryCache::memory();
        let err = cache
            .get_or_compute::<u32, _>(&key(2), || Err(Error::InvalidInput("boom".into())))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let v: u32 = cache.get_or_compute(&key(2), || Ok(1)).unwrap();
        assert_eq!(v, 1);
    }

    #[test]
    fn test_concurrent_callers_compute_once() {
        let cache = Arc::new(QueryCache::memory());
        let computed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let computed = Arc::clone(&computed);
                std::thread::spawn(move || {
                    cache
                        .get_or_compute(&key(3), || {
                            computed.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(50));
                            Ok(String::from("done"))
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "done");
        }
        assert_eq!(computed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disk_cache_persists_and_recovers_from_corruption() {
        let temp = TempDir::new().unwrap();
        {
            let cache = QueryCache::disk(temp.path()).unwrap();
            let _: Vec<u32> = cache.get_or_compute(&key(4), || Ok(vec![1, 2])).unwrap();
        }

        let cache = QueryCache::disk(temp.path()).unwrap();
        let v: Vec<u32> = cache.get_or_compute(&key(4), || Ok(vec![9])).unwrap();
        assert_eq!(v, vec![1, 2]);

        std::fs::write(temp.path().join(format!("{}.json", key(4).as_str())), "{not json").unwrap();
        let v: Vec<u32> = cache.get_or_compute(&key(4), || Ok(vec![3])).unwrap();
        assert_eq!(v, vec![3]);

        cache.clear().unwrap();
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
