//! Trait bound shared by every value that flows through an executor.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// A response payload that can be held in request state and in the cache.
///
/// Implemented automatically for every owned, cloneable serde type, so plain
/// structs, `Vec<T>`, `serde_json::Value` and
/// [`PageResponse`](crate::pagination::PageResponse) all qualify.
///
/// # Example
///
/// ```
/// use request_kit::Payload;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Product {
///     id: u64,
///     name: String,
/// }
///
/// fn assert_payload<T: Payload>() {}
/// assert_payload::<Product>();
/// assert_payload::<Vec<Product>>();
/// ```
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Encode for cache storage (see [`crate::serialization`]).
    fn serialize_for_cache(&self) -> Result<Vec<u8>> {
        crate::serialization::serialize_for_cache(self)
    }

    /// Decode from cache storage, validating magic and schema version.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCacheEntry`: bad magic or truncated header
    /// - `Error::VersionMismatch`: schema version changed
    /// - `Error::DeserializationError`: body does not decode as `Self`
    fn deserialize_from_cache(bytes: &[u8]) -> Result<Self> {
        crate::serialization::deserialize_from_cache(bytes)
    }
}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
