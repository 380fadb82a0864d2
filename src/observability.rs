//! Metrics hooks for cache and request lifecycle events.
//!
//! Two sinks, one per layer:
//!
//! - [`CacheMetrics`]: hits, misses, writes, deletes and errors of a
//!   [`RequestCache`](crate::cache::RequestCache)
//! - [`RequestMetrics`]: attempts, retries, successes and terminal failures of
//!   a [`RequestExecutor`](crate::executor::RequestExecutor)
//!
//! Default trait methods log through the `log` crate, so an empty
//! `impl CacheMetrics for MySink {}` already produces debug output.
//! [`NoOpMetrics`] implements both traits and records nothing; it is the
//! default everywhere.
//!
//! ```ignore
//! use request_kit::observability::RequestMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl RequestMetrics for PrometheusMetrics {
//!     fn record_retry(&self, label: &str, attempt: u32, delay: Duration) {
//!         // counter!("request_retries", "label" => label).inc();
//!     }
//! }
//! ```

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str) {
        debug!("Cache HIT: {}", key);
    }

    /// Record a cache miss (absent or expired).
    fn record_miss(&self, key: &str) {
        debug!("Cache MISS: {}", key);
    }

    /// Record a cache write.
    fn record_set(&self, key: &str, bytes: usize) {
        debug!("Cache SET: {} ({} bytes)", key, bytes);
    }

    /// Record a cache delete.
    fn record_delete(&self, key: &str) {
        debug!("Cache DELETE: {}", key);
    }

    /// Record a cache error (backend failure or undecodable entry).
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Trait for request lifecycle metrics.
///
/// `label` is the executor's cache key, or `"uncached"` for executors without one.
pub trait RequestMetrics: Send + Sync {
    /// A call to the remote operation is about to be made.
    fn record_attempt(&self, label: &str, attempt: u32) {
        debug!("Request ATTEMPT: {} #{}", label, attempt);
    }

    /// An attempt failed and another one is scheduled after `delay`.
    fn record_retry(&self, label: &str, attempt: u32, delay: Duration) {
        debug!("Request RETRY: {} #{} in {:?}", label, attempt, delay);
    }

    /// The call chain finished successfully.
    fn record_success(&self, label: &str, duration: Duration, from_cache: bool) {
        debug!(
            "Request SUCCESS: {} in {:?} (from cache: {})",
            label, duration, from_cache
        );
    }

    /// The call chain failed for good.
    fn record_failure(&self, label: &str, duration: Duration, message: &str) {
        warn!("Request FAILURE: {} after {:?}: {}", label, duration, message);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str) {}
    fn record_miss(&self, _key: &str) {}
    fn record_set(&self, _key: &str, _bytes: usize) {}
    fn record_delete(&self, _key: &str) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

impl RequestMetrics for NoOpMetrics {
    fn record_attempt(&self, _label: &str, _attempt: u32) {}
    fn record_retry(&self, _label: &str, _attempt: u32, _delay: Duration) {}
    fn record_success(&self, _label: &str, _duration: Duration, _from_cache: bool) {}
    fn record_failure(&self, _label: &str, _duration: Duration, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("key");
        metrics.record_miss("key");
        metrics.record_retry("key", 1, Duration::from_secs(1));
    }

    #[test]
    fn test_default_methods_are_optional() {
        #[derive(Default)]
        struct CountingRetries(AtomicUsize);

        impl RequestMetrics for CountingRetries {
            fn record_retry(&self, _label: &str, _attempt: u32, _delay: Duration) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let metrics = CountingRetries::default();
        metrics.record_attempt("users", 1);
        metrics.record_retry("users", 1, Duration::from_millis(10));
        metrics.record_success("users", Duration::from_millis(20), false);
        assert_eq!(metrics.0.load(Ordering::SeqCst), 1);
    }
}
