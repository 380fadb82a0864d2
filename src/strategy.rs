//! Cache strategies for a single execution.
//!
//! | Strategy | Cache lookup | Before fetch | Write-through |
//! |----------|--------------|--------------|---------------|
//! | **CacheFirst** | yes, hit returns without fetching | - | yes |
//! | **Invalidate** | yes, after the delete | delete key | yes |
//! | **Bypass** | no | - | yes |
//!
//! `execute` uses `CacheFirst`, `refetch` uses `Invalidate`. There is no
//! stale-while-revalidate: a hit never triggers a background fetch.

/// Strategy enum controlling how one execution uses the cache.
///
/// # Examples
///
/// ```
/// use request_kit::strategy::FetchStrategy;
///
/// assert_eq!(FetchStrategy::default(), FetchStrategy::CacheFirst);
/// assert!(FetchStrategy::Invalidate.reads_cache());
/// assert!(!FetchStrategy::Bypass.reads_cache());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// Return a live cached payload if there is one, otherwise fetch.
    #[default]
    CacheFirst,

    /// Delete the cached payload, then proceed as `CacheFirst`.
    Invalidate,

    /// Never read the cache; successful results are still written.
    Bypass,
}

impl FetchStrategy {
    /// Whether attempts consult the cache before calling the remote operation.
    pub fn reads_cache(self) -> bool {
        !matches!(self, FetchStrategy::Bypass)
    }
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::CacheFirst => write!(f, "CacheFirst"),
            FetchStrategy::Invalidate => write!(f, "Invalidate"),
            FetchStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}
