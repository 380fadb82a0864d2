//! Cache backend implementations.

use crate::error::Result;
use std::time::Duration;

pub mod inmemory;

pub use inmemory::{CacheStats, InMemoryBackend};

/// Byte store behind a [`RequestCache`](crate::cache::RequestCache).
///
/// Every entry is written with a TTL. Expiry is lazy: `get` treats an entry
/// as absent once `now - stored_at >= ttl` and removes it on that read. There
/// is no background sweep; `purge_expired` is the explicit way to reclaim
/// expired-but-unread entries.
///
/// All methods take `&self`; implementations use interior mutability so one
/// backend can be cloned into many executors and shared across tasks.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve a live entry.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - entry present and younger than its TTL
    /// - `Ok(None)` - never stored, deleted, or expired
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store an entry, replacing any previous value and restarting its clock.
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove one entry. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every entry whose key starts with `prefix`, returning how many
    /// were removed.
    ///
    /// # Errors
    /// Returns `Err` if not supported by this backend.
    async fn delete_prefix(&self, _prefix: &str) -> Result<usize> {
        Err(crate::error::Error::NotImplemented(
            "delete_prefix not implemented for this backend".to_string(),
        ))
    }

    /// Remove every entry.
    ///
    /// # Errors
    /// Returns `Err` if not supported by this backend.
    async fn clear_all(&self) -> Result<()> {
        Err(crate::error::Error::NotImplemented(
            "clear_all not implemented for this backend".to_string(),
        ))
    }

    /// Sweep expired entries now, returning how many were removed.
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    /// Check whether a live entry exists.
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
