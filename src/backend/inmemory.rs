//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for concurrent access with per-key sharding. Expiry is
//! measured on the tokio clock, so tests running with paused time can drive
//! TTLs with `tokio::time::advance`.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Stored payload plus the timestamp its TTL is measured from.
struct CacheEntry {
    data: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        CacheEntry {
            data,
            stored_at: Instant::now(),
            ttl,
        }
    }

    // Visible only while now - stored_at < ttl.
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same store.
///
/// # Example
///
/// ```no_run
/// use request_kit::backend::{CacheBackend, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///     backend.set("users", b"[]".to_vec(), Duration::from_secs(300)).await?;
///     assert!(backend.get("users").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of stored entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get memory statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for entry in self.store.iter() {
            stats.total_entries += 1;
            stats.total_bytes += entry.data.len();
            if entry.is_expired() {
                stats.expired_entries += 1;
            }
        }
        stats
    }

    /// Print cache statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Cache Stats: {} entries ({} expired), {} bytes",
            stats.total_entries, stats.expired_entries, stats.total_bytes
        );
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Lazy expiry: drop the entry only if it is still the expired one.
        if self.store.remove_if(key, |_, e| e.is_expired()).is_some() {
            debug!("✓ InMemory GET {} -> EXPIRED", key);
        } else {
            debug!("✓ InMemory GET {} -> MISS", key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.store
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        debug!("✓ InMemory SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let before = self.store.len();
        self.store.retain(|k, _| !k.starts_with(prefix));
        let removed = before.saturating_sub(self.store.len());
        debug!("✓ InMemory DELETE_PREFIX {} ({} keys)", prefix, removed);
        Ok(removed)
    }

    async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all cache cleared!");
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let before = self.store.len();
        self.store.retain(|_, e| !e.is_expired());
        let removed = before.saturating_sub(self.store.len());
        debug!("✓ InMemory PURGE {} expired entries", removed);
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.get(key).is_some_and(|e| !e.is_expired()))
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), TTL)
            .await
            .expect("Failed to set");

        let result = backend.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_miss() {
        let backend = InMemoryBackend::new();

        let result = backend.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_backend_ttl_boundary() {
        let backend = InMemoryBackend::new();
        backend
            .set("key1", b"value1".to_vec(), Duration::from_millis(100))
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_millis(99)).await;
        assert!(backend.get("key1").await.expect("Failed to get").is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(backend.get("key1").await.expect("Failed to get").is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_stays_until_read() {
        let backend = InMemoryBackend::new();
        backend
            .set("stale", b"v".to_vec(), Duration::from_secs(1))
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(backend.len(), 1);
        assert_eq!(backend.stats().expired_entries, 1);
        assert!(!backend.exists("stale").await.expect("Failed to check"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_restarts_clock() {
        let backend = InMemoryBackend::new();
        backend
            .set("key", b"a".to_vec(), Duration::from_secs(10))
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_secs(8)).await;
        backend
            .set("key", b"b".to_vec(), Duration::from_secs(10))
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(
            backend.get("key").await.expect("Failed to get"),
            Some(b"b".to_vec())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let backend = InMemoryBackend::new();
        backend
            .set("short", b"1".to_vec(), Duration::from_secs(1))
            .await
            .expect("Failed to set");
        backend
            .set("long", b"2".to_vec(), Duration::from_secs(60))
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_secs(5)).await;

        let removed = backend.purge_expired().await.expect("Failed to purge");
        assert_eq!(removed, 1);
        assert_eq!(backend.len(), 1);
        assert!(backend.get("long").await.expect("Failed to get").is_some());
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete_prefix() {
        let backend = InMemoryBackend::new();
        for key in ["orders:page:1", "orders:page:2", "orders-archive", "users"] {
            backend
                .set(key, b"x".to_vec(), TTL)
                .await
                .expect("Failed to set");
        }

        let removed = backend
            .delete_prefix("orders:")
            .await
            .expect("Failed to delete prefix");

        assert_eq!(removed, 2);
        assert!(backend.exists("orders-archive").await.expect("exists"));
        assert!(backend.exists("users").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear_all() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), TTL)
            .await
            .expect("Failed to set");
        backend
            .set("key2", b"value2".to_vec(), TTL)
            .await
            .expect("Failed to set");

        assert_eq!(backend.len(), 2);
        backend.clear_all().await.expect("Failed to clear");
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clone_shares_store() {
        let backend1 = InMemoryBackend::new();
        backend1
            .set("key", b"value".to_vec(), TTL)
            .await
            .expect("Failed to set");

        let backend2 = backend1.clone();
        assert_eq!(
            backend2.get("key").await.expect("Failed to get"),
            Some(b"value".to_vec())
        );
    }

    #[tokio::test]
    async fn test_inmemory_backend_thread_safe() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for i in 0..10 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                b.set(&format!("key_{}", i), vec![i as u8], TTL)
                    .await
                    .expect("Failed to set");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(backend.len(), 10);
    }
}
