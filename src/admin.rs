//! Global cache administration.

use crate::backend::{CacheBackend, CacheStats, InMemoryBackend};
use crate::cache::RequestCache;
use crate::error::Result;

/// Cache-wide operations, e.g. for logout.
///
/// ```no_run
/// use request_kit::{CacheAdmin, RequestCache};
///
/// # async fn logout() -> request_kit::Result<()> {
/// // Cached payloads must not leak into the next user's session.
/// CacheAdmin::new(RequestCache::shared()).clear_all_cache().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheAdmin<B: CacheBackend = InMemoryBackend> {
    cache: RequestCache<B>,
}

impl<B: CacheBackend> CacheAdmin<B> {
    pub fn new(cache: RequestCache<B>) -> Self {
        CacheAdmin { cache }
    }

    /// Empty the whole cache.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails or cannot be cleared.
    pub async fn clear_all_cache(&self) -> Result<()> {
        warn!("⚠ Clearing ALL cache entries");
        self.cache.clear().await?;
        info!("✓ Cache cleared");
        Ok(())
    }

    /// Reclaim expired entries nobody has read since they expired.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails.
    pub async fn purge_expired(&self) -> Result<usize> {
        let removed = self.cache.purge_expired().await?;
        debug!("✓ Purged {} expired entries", removed);
        Ok(removed)
    }

    pub fn cache(&self) -> &RequestCache<B> {
        &self.cache
    }
}

impl CacheAdmin<InMemoryBackend> {
    /// Entry counts and payload bytes of the in-memory store.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
