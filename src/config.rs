//! Executor configuration.

use crate::cache::DEFAULT_CACHE_DURATION;
use crate::liveness::LivenessToken;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Callback invoked with the payload of a successful fetch.
pub type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Callback invoked with the resolved message of a terminal failure.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Which of several overlapping calls on one executor may write state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// Every call writes when it completes; the last to complete wins.
    #[default]
    LastCompletionWins,

    /// Only the most recently issued call writes state, writes the cache and
    /// fires callbacks. Earlier calls still return their result.
    LatestIssued,
}

/// Configuration surface of a [`RequestExecutor`](crate::executor::RequestExecutor).
///
/// # Example
///
/// ```
/// use request_kit::ExecutorConfig;
/// use std::time::Duration;
///
/// let config: ExecutorConfig<Vec<String>> = ExecutorConfig::default()
///     .with_cache_key("categories")
///     .with_cache_duration(Duration::from_secs(60))
///     .with_retry(2, Duration::from_millis(500))
///     .with_initial_data(Vec::new())
///     .on_error(|message| eprintln!("categories failed: {}", message));
///
/// assert_eq!(config.retry_count, 2);
/// assert!(!config.immediate);
/// ```
pub struct ExecutorConfig<T> {
    /// Run the first execution from `mount`.
    pub immediate: bool,

    /// Value `data` starts with and returns to on `reset`.
    pub initial_data: Option<T>,

    /// Cache key; `None` disables caching for this executor.
    pub cache_key: Option<String>,

    /// TTL of the entries this executor writes.
    pub cache_duration: Duration,

    /// Retries after the first attempt (0 = single attempt).
    pub retry_count: u32,

    /// Fixed delay before each retry.
    pub retry_delay: Duration,

    pub on_success: Option<SuccessCallback<T>>,
    pub on_error: Option<ErrorCallback>,

    pub concurrency: ConcurrencyPolicy,

    /// Liveness token; share one between components owned by the same view.
    pub liveness: LivenessToken,
}

impl<T> ExecutorConfig<T> {
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    /// Set retry count and delay.
    ///
    /// ```
    /// use request_kit::ExecutorConfig;
    /// use std::time::Duration;
    ///
    /// let config = ExecutorConfig::<u8>::default().with_retry(3, Duration::from_millis(250));
    /// assert_eq!(config.retry_count, 3);
    /// ```
    pub fn with_retry(mut self, count: u32, delay: Duration) -> Self {
        self.retry_count = count;
        self.retry_delay = delay;
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn with_concurrency(mut self, policy: ConcurrencyPolicy) -> Self {
        self.concurrency = policy;
        self
    }

    pub fn with_liveness(mut self, token: LivenessToken) -> Self {
        self.liveness = token;
        self
    }
}

impl<T> Default for ExecutorConfig<T> {
    fn default() -> Self {
        ExecutorConfig {
            immediate: false,
            initial_data: None,
            cache_key: None,
            cache_duration: DEFAULT_CACHE_DURATION,
            retry_count: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            on_success: None,
            on_error: None,
            concurrency: ConcurrencyPolicy::default(),
            liveness: LivenessToken::new(),
        }
    }
}

impl<T: Clone> Clone for ExecutorConfig<T> {
    fn clone(&self) -> Self {
        ExecutorConfig {
            immediate: self.immediate,
            initial_data: self.initial_data.clone(),
            cache_key: self.cache_key.clone(),
            cache_duration: self.cache_duration,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            concurrency: self.concurrency,
            liveness: self.liveness.clone(),
        }
    }
}

impl<T> fmt::Debug for ExecutorConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field("immediate", &self.immediate)
            .field("has_initial_data", &self.initial_data.is_some())
            .field("cache_key", &self.cache_key)
            .field("cache_duration", &self.cache_duration)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
