//! Versioned cache framing for request payloads.
//!
//! Every payload written to a [`CacheBackend`](crate::backend::CacheBackend)
//! goes through this module:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│  JSON PAYLOAD (N bytes)  │
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "RQKT"              u32 (LE)         serde_json::to_vec(T)
//! ```
//!
//! The body is JSON rather than a compact binary codec: remote payloads are
//! JSON-shaped, and page responses are untagged (bare list or `{items, total}`)
//! which needs a self-describing format to decode.
//!
//! # Example
//!
//! ```rust
//! use request_kit::serialization::{deserialize_from_cache, serialize_for_cache};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # fn main() -> request_kit::Result<()> {
//! let user = User { id: 1, name: "Alice".to_string() };
//! let bytes = serialize_for_cache(&user)?;
//! assert_eq!(&bytes[0..4], b"RQKT");
//!
//! let back: User = deserialize_from_cache(&bytes)?;
//! assert_eq!(user, back);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Magic header for request-kit cache entries: b"RQKT"
pub const CACHE_MAGIC: [u8; 4] = *b"RQKT";

/// Current schema version.
///
/// Bump when the framing changes. Entries written with another version are
/// rejected with [`Error::VersionMismatch`] and evicted by the cache.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// Encode a payload with the cache header.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the payload cannot be encoded as JSON.
pub fn serialize_for_cache<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(&CACHE_MAGIC);
    bytes.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_le_bytes());
    serde_json::to_writer(&mut bytes, value).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })?;
    Ok(bytes)
}

/// Decode a payload written by [`serialize_for_cache`].
///
/// Validation order: header length and magic, then version, then the body.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: truncated header or wrong magic
/// - `Error::VersionMismatch`: written by another schema version
/// - `Error::DeserializationError`: body is not valid JSON for `T`
pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidCacheEntry(format!(
            "entry too short: {} bytes",
            bytes.len()
        )));
    }

    let (header, body) = bytes.split_at(HEADER_LEN);
    if header[0..4] != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC,
            &header[0..4]
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC,
            &header[0..4]
        )));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&header[4..8]);
    let version = u32::from_le_bytes(version);
    if version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: version,
        });
    }

    serde_json::from_slice(body).map_err(|e| {
        error!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })
}
