//! Generic TTL cache with single-flight loading
//!
//! Reads are lock-free `DashMap` lookups. Misses go through one async mutex
//! per cache: the loader re-checks the map after acquiring it, so concurrent
//! misses collapse into a single upstream load. Failed loads are not cached.

use dashmap::DashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Cached value with its insertion time
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug)]
struct Inner<K: Eq + Hash, V> {
    name: &'static str,
    entries: DashMap<K, CacheEntry<V>>,
    load_lock: Mutex<()>,
    ttl: Duration,
}

/// TTL cache shared by cheap clones.
#[derive(Debug)]
pub struct TtlCache<K: Eq + Hash, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Create a new cache; `name` only appears in log fields.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                entries: DashMap::new(),
                load_lock: Mutex::new(()),
                ttl,
            }),
        }
    }

    /// Get a cached value if present and not expired
    pub fn get(&self, key: &K) -> Option<V> {
        let expired = match self.inner.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.inner.ttl => {
                debug!(cache = self.inner.name, key = ?key, "Cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!(cache = self.inner.name, key = ?key, "Cache entry expired");
            let ttl = self.inner.ttl;
            self.inner.entries.remove_if(key, |_, entry| entry.inserted_at.elapsed() >= ttl);
        }
        None
    }

    /// Return the cached value for `key`, running `loader` at most once per miss.
    ///
    /// Callers racing on a miss wait for the first loader and then read its
    /// result. An error from the loader is returned to that caller only and
    /// leaves the cache untouched.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: K, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let _guard = self.inner.load_lock.lock().await;
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        debug!(cache = self.inner.name, key = ?key, "Cache miss, loading");
        let value = loader().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Insert a value, replacing any existing entry
    pub fn insert(&self, key: K, value: V) {
        debug!(
            cache = self.inner.name,
            key = ?key,
            ttl_secs = %self.inner.ttl.as_secs(),
            "Caching value"
        );
        self.inner.entries.insert(key, CacheEntry { value, inserted_at: Instant::now() });
    }

    /// Invalidate a specific cache entry
    pub fn invalidate(&self, key: &K) {
        debug!(cache = self.inner.name, key = ?key, "Invalidating cache entry");
        self.inner.entries.remove(key);
    }

    /// Clear all cache entries
    pub fn flush(&self) {
        debug!(cache = self.inner.name, "Flushing cache");
        self.inner.entries.clear();
    }

    /// Remove expired entries
    pub fn cleanup_expired(&self) {
        let ttl = self.inner.ttl;
        self.inner.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
    }

    /// Number of entries, including expired ones not yet cleaned up
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }
}

impl<K: Eq + Hash, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}
