//! Cache key management utilities.

/// Separator between key segments.
pub const KEY_SEPARATOR: char = ':';

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build a key from a prefix and an id: `"{prefix}:{id}"`.
    pub fn build_with_prefix(prefix: &str, id: &dyn std::fmt::Display) -> String {
        format!("{}{}{}", prefix, KEY_SEPARATOR, id)
    }

    /// Build composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    /// Key for one page of a paginated query: `"{base}:page:{page}:limit:{limit}"`.
    pub fn page_key(base: &str, page: u32, limit: u32) -> String {
        format!("{}:page:{}:limit:{}", base, page, limit)
    }

    /// Prefix shared by every page key derived from `base`.
    pub fn page_prefix(base: &str) -> String {
        format!("{}:page:", base)
    }

    /// Parse a composite key into parts.
    pub fn parse(key: &str) -> Vec<&str> {
        key.split(KEY_SEPARATOR).collect()
    }
}
