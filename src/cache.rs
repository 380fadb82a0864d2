//! Typed, shareable request cache.
//!
//! [`RequestCache`] is the cache-service object every executor receives. It
//! wraps a [`CacheBackend`] in a cheap-to-clone handle, encodes payloads with
//! the versioned framing from [`crate::serialization`] and applies the default
//! TTL of five minutes unless a caller passes its own.
//!
//! Executors built from clones of one handle share entries; a fresh handle
//! gives an isolated cache (one per test, for instance).

use crate::backend::{CacheBackend, CacheStats, InMemoryBackend};
use crate::error::{Error, Result};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::payload::Payload;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Default time-to-live for cached payloads.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Shareable handle over a cache backend.
///
/// # Example
///
/// ```no_run
/// use request_kit::RequestCache;
///
/// # async fn demo() -> request_kit::Result<()> {
/// let cache = RequestCache::in_memory();
/// cache.set("settings", &vec!["dark-mode".to_string()]).await?;
///
/// let settings: Option<Vec<String>> = cache.get("settings").await?;
/// assert!(settings.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestCache<B: CacheBackend = InMemoryBackend> {
    backend: B,
    default_ttl: Duration,
    metrics: Arc<dyn CacheMetrics>,
}

impl RequestCache<InMemoryBackend> {
    /// New isolated in-memory cache.
    pub fn in_memory() -> Self {
        Self::new(InMemoryBackend::new())
    }

    /// Process-wide in-memory cache, created on first use.
    ///
    /// Every call returns a handle to the same store.
    pub fn shared() -> Self {
        static SHARED: OnceLock<RequestCache<InMemoryBackend>> = OnceLock::new();
        SHARED.get_or_init(Self::in_memory).clone()
    }

    /// Number of stored entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Entry counts and payload bytes.
    pub fn stats(&self) -> CacheStats {
        self.backend.stats()
    }
}

impl<B: CacheBackend> RequestCache<B> {
    /// Create a cache over the given backend.
    pub fn new(backend: B) -> Self {
        RequestCache {
            backend,
            default_ttl: DEFAULT_CACHE_DURATION,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set the TTL used by [`set`](Self::set).
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Read a live payload.
    ///
    /// An entry that cannot be decoded as `T` (wrong type, foreign bytes, old
    /// schema version) is evicted and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns `Err` only when the backend itself fails.
    pub async fn get<T: Payload>(&self, key: &str) -> Result<Option<T>> {
        let bytes = match self.backend.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.metrics.record_miss(key);
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                return Err(e);
            }
        };

        match T::deserialize_from_cache(&bytes) {
            Ok(value) => {
                self.metrics.record_hit(key);
                Ok(Some(value))
            }
            Err(e) => {
                warn!("Evicting undecodable cache entry {}: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
                self.backend.delete(key).await?;
                Ok(None)
            }
        }
    }

    /// Store a payload with the default TTL.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the payload cannot be encoded or the backend fails.
    pub async fn set<T: Payload>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Store a payload with an explicit TTL.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the payload cannot be encoded, the TTL is zero, or the
    /// backend fails.
    pub async fn set_with_ttl<T: Payload>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(Error::ConfigError(format!(
                "cache TTL for {} must be greater than zero",
                key
            )));
        }

        let bytes = value.serialize_for_cache()?;
        let len = bytes.len();
        self.backend.set(key, bytes, ttl).await?;
        self.metrics.record_set(key, len);
        Ok(())
    }

    /// Remove one entry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.backend.delete(key).await?;
        self.metrics.record_delete(key);
        Ok(())
    }

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails or does not support prefix deletes.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let removed = self.backend.delete_prefix(prefix).await?;
        self.metrics.record_delete(prefix);
        Ok(removed)
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails or does not support clearing.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear_all().await
    }

    /// Sweep expired-but-unread entries now.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails.
    pub async fn purge_expired(&self) -> Result<usize> {
        self.backend.purge_expired().await
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl Default for RequestCache<InMemoryBackend> {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Category {
        id: u32,
        name: String,
    }

    fn category() -> Category {
        Category {
            id: 1,
            name: "Books".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_get() {
        let cache = RequestCache::in_memory();
        cache.set("categories:1", &category()).await.expect("set");

        let cached: Option<Category> = cache.get("categories:1").await.expect("get");
        assert_eq!(cached, Some(category()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_is_five_minutes() {
        let cache = RequestCache::in_memory();
        assert_eq!(cache.default_ttl(), DEFAULT_CACHE_DURATION);
        cache.set("categories", &vec![category()]).await.expect("set");

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache
            .get::<Vec<Category>>("categories")
            .await
            .expect("get")
            .is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache
            .get::<Vec<Category>>("categories")
            .await
            .expect("get")
            .is_none());
    }

    #[tokio::test]
    async fn test_wrong_type_is_evicted() {
        let cache = RequestCache::in_memory();
        cache.set("mixed", &vec![1u32, 2, 3]).await.expect("set");

        let read: Option<Category> = cache.get("mixed").await.expect("get");
        assert!(read.is_none());
        assert!(cache.backend().is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = RequestCache::in_memory();
        let result = cache.set_with_ttl("k", &1u8, Duration::ZERO).await;
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = RequestCache::in_memory();
        let other = cache.clone();
        cache.set("shared", &"value".to_string()).await.expect("set");

        let read: Option<String> = other.get("shared").await.expect("get");
        assert_eq!(read.as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_shared_is_process_wide() {
        let a = RequestCache::shared();
        let b = RequestCache::shared();
        a.set("test_shared_is_process_wide", &7u32).await.expect("set");

        let read: Option<u32> = b.get("test_shared_is_process_wide").await.expect("get");
        assert_eq!(read, Some(7));
        b.delete("test_shared_is_process_wide").await.expect("delete");
    }

    #[tokio::test]
    async fn test_metrics_receive_events() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<String>>);

        impl CacheMetrics for Recorder {
            fn record_hit(&self, key: &str) {
                self.0.lock().unwrap().push(format!("hit:{}", key));
            }
            fn record_miss(&self, key: &str) {
                self.0.lock().unwrap().push(format!("miss:{}", key));
            }
        }

        let recorder = Arc::new(Recorder::default());
        let cache = RequestCache::in_memory().with_metrics(recorder.clone());

        let _ = cache.get::<u32>("n").await.expect("get");
        cache.set("n", &1u32).await.expect("set");
        let _ = cache.get::<u32>("n").await.expect("get");

        assert_eq!(*recorder.0.lock().unwrap(), vec!["miss:n", "hit:n"]);
    }
}
