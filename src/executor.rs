//! Request executor - one logical request instance.
//!
//! A [`RequestExecutor`] binds a [`RemoteOperation`] to an [`ExecutorConfig`]
//! and a [`RequestCache`], and owns the [`RequestState`] a view renders from.
//!
//! # Flow of one `execute`
//!
//! ```text
//! ┌─► cache lookup ── hit ──► data = payload, return {success, fromCache}
//! │        │ miss
//! │        ▼
//! │   loading = true, error = None, call remote
//! │        │
//! │        ├── success:true + data ──► data, write-through, retries = 0,
//! │        │                           on_success, return {success}
//! │        ▼
//! │   resolve message (nested → top-level → default)
//! │        │
//! └─ retries left? sleep(retry_delay) ── no ──► error, on_error,
//!                                                return {success:false}
//!
//! finally: loading = false, is_refetching = false
//! ```
//!
//! Every state write is gated by the liveness token (and, under
//! [`ConcurrencyPolicy::LatestIssued`], by the call's generation). Results are
//! always returned to the caller, even when their writes were suppressed.

use crate::backend::{CacheBackend, InMemoryBackend};
use crate::cache::RequestCache;
use crate::config::{ConcurrencyPolicy, ExecutorConfig};
use crate::envelope::{resolve_message, ExecuteResult};
use crate::error::Error;
use crate::liveness::LivenessToken;
use crate::observability::{NoOpMetrics, RequestMetrics};
use crate::payload::Payload;
use crate::remote::RemoteOperation;
use crate::strategy::FetchStrategy;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

const UNCACHED_LABEL: &str = "uncached";

/// Observable state of one executor.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_refetching: bool,
}

impl<T> RequestState<T> {
    fn new(data: Option<T>) -> Self {
        RequestState {
            data,
            loading: false,
            error: None,
            is_refetching: false,
        }
    }
}

/// Retry bookkeeping of the current call chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryState {
    /// Retries performed so far in the current chain.
    pub attempt_count: u32,
    /// Configured `retry_count`.
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Orchestrates one logical request: cache, invocation, retry, state.
///
/// Methods take `&self`, so an executor can be shared behind an `Arc` and
/// several calls may be in flight at once; see [`ConcurrencyPolicy`] for who
/// gets to write state.
///
/// # Example
///
/// ```no_run
/// use request_kit::remote::from_fn;
/// use request_kit::{Envelope, ExecutorConfig, RequestCache, RequestExecutor};
/// use std::time::Duration;
///
/// # async fn demo() {
/// let cache = RequestCache::shared();
/// let users = RequestExecutor::new(
///     from_fn(|_: ()| async { Ok::<_, request_kit::Error>(Envelope::ok(vec!["ana".to_string()])) }),
///     cache,
///     ExecutorConfig::default()
///         .with_cache_key("users")
///         .with_retry(2, Duration::from_millis(500)),
/// );
///
/// let result = users.execute(()).await;
/// assert!(result.success);
/// assert_eq!(users.data(), Some(vec!["ana".to_string()]));
/// # }
/// ```
pub struct RequestExecutor<A, T, R, B = InMemoryBackend>
where
    B: CacheBackend,
{
    operation: R,
    cache: RequestCache<B>,
    config: ExecutorConfig<T>,
    metrics: Arc<dyn RequestMetrics>,
    state: Mutex<RequestState<T>>,
    attempt_count: AtomicU32,
    generation: AtomicU64,
    _args: PhantomData<fn(A)>,
}

impl<A, T, R, B> RequestExecutor<A, T, R, B>
where
    A: Clone,
    T: Payload,
    R: RemoteOperation<A, T>,
    B: CacheBackend,
{
    /// Create an executor. State starts at `config.initial_data`.
    pub fn new(operation: R, cache: RequestCache<B>, config: ExecutorConfig<T>) -> Self {
        let state = RequestState::new(config.initial_data.clone());
        RequestExecutor {
            operation,
            cache,
            config,
            metrics: Arc::new(NoOpMetrics),
            state: Mutex::new(state),
            attempt_count: AtomicU32::new(0),
            generation: AtomicU64::new(0),
            _args: PhantomData,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn RequestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run the initial execution if the executor is configured `immediate`.
    pub async fn mount(&self, args: A) -> Option<ExecuteResult<T>> {
        if !self.config.immediate {
            return None;
        }
        Some(self.execute(args).await)
    }

    /// Cache-first execution with bounded retry.
    ///
    /// Never fails: terminal failures come back as `success: false` and are
    /// recorded in [`RequestState::error`].
    ///
    /// Disposing the executor during a retry delay abandons the remaining
    /// retries; the caller then receives the last failure as `success: false`.
    pub async fn execute(&self, args: A) -> ExecuteResult<T> {
        self.execute_with_strategy(args, FetchStrategy::CacheFirst)
            .await
    }

    /// Drop this executor's cache entry, flag `is_refetching`, then execute.
    pub async fn refetch(&self, args: A) -> ExecuteResult<T> {
        self.clear_cache().await;
        self.write(|state| state.is_refetching = true);
        self.execute(args).await
    }

    /// Execute with an explicit cache strategy.
    pub async fn execute_with_strategy(&self, args: A, strategy: FetchStrategy) -> ExecuteResult<T> {
        let key = self.config.cache_key.clone();
        self.execute_keyed(args, key, strategy).await
    }

    /// Execute under a caller-supplied cache key instead of the configured one.
    pub(crate) async fn execute_keyed(
        &self,
        args: A,
        key: Option<String>,
        strategy: FetchStrategy,
    ) -> ExecuteResult<T> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let label = key.as_deref().unwrap_or(UNCACHED_LABEL);
        let started = Instant::now();

        debug!(
            "» Request {} (strategy: {}, generation: {})",
            label, strategy, generation
        );

        if strategy == FetchStrategy::Invalidate {
            if let Some(key) = key.as_deref() {
                self.evict(key).await;
            }
        }

        let mut retries = 0;
        self.set_attempts(generation, 0);

        let outcome = loop {
            if strategy.reads_cache() {
                if let Some(key) = key.as_deref() {
                    if let Some(data) = self.lookup(key).await {
                        self.apply(generation, |state| state.data = Some(data.clone()));
                        self.metrics
                            .record_success(label, started.elapsed(), true);
                        break ExecuteResult::cached(data);
                    }
                }
            }

            self.apply(generation, |state| {
                state.loading = true;
                state.error = None;
            });
            self.metrics.record_attempt(label, retries + 1);

            let message = match self.operation.call(args.clone()).await {
                Ok(envelope) if envelope.success => match envelope.data {
                    Some(data) => {
                        self.complete(generation, key.as_deref(), &data).await;
                        self.metrics
                            .record_success(label, started.elapsed(), false);
                        info!("✓ Request {} succeeded in {:?}", label, started.elapsed());
                        break ExecuteResult::fetched(data);
                    }
                    None => resolve_message(&Error::Shape(
                        "success response without data".to_string(),
                    )),
                },
                Ok(envelope) => resolve_message(&envelope),
                Err(fault) => resolve_message(&fault),
            };

            if retries < self.config.retry_count && self.is_live() {
                retries += 1;
                self.set_attempts(generation, retries);
                self.metrics
                    .record_retry(label, retries, self.config.retry_delay);
                warn!(
                    "Request {} failed (retry {}/{} in {:?}): {}",
                    label, retries, self.config.retry_count, self.config.retry_delay, message
                );
                tokio::time::sleep(self.config.retry_delay).await;
                if self.is_live() {
                    continue;
                }
                debug!("Request {} disposed during retry delay, abandoning", label);
            }

            self.fail(generation, &message);
            self.metrics
                .record_failure(label, started.elapsed(), &message);
            break ExecuteResult::failed(message);
        };

        self.apply(generation, |state| {
            state.loading = false;
            state.is_refetching = false;
        });
        outcome
    }

    /// Restore initial state and zero the retry state.
    ///
    /// Under [`ConcurrencyPolicy::LatestIssued`] calls still in flight are
    /// superseded and will not write.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let initial = self.config.initial_data.clone();
        if self.write(|state| *state = RequestState::new(initial)) {
            self.attempt_count.store(0, Ordering::Release);
        }
    }

    /// Remove only this executor's cache entry.
    pub async fn clear_cache(&self) {
        if let Some(key) = self.config.cache_key.as_deref() {
            self.evict(key).await;
        }
    }

    /// Assign `data` directly.
    pub fn set_data(&self, value: Option<T>) {
        self.write(|state| state.data = value);
    }

    /// Stop all further state writes.
    pub fn dispose(&self) {
        self.config.liveness.dispose();
    }

    pub fn is_live(&self) -> bool {
        self.config.liveness.is_live()
    }

    pub fn liveness(&self) -> &LivenessToken {
        &self.config.liveness
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<T> {
        self.lock_state().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.lock_state().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock_state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn retry_state(&self) -> RetryState {
        RetryState {
            attempt_count: self.attempt_count.load(Ordering::Acquire),
            max_attempts: self.config.retry_count,
            delay: self.config.retry_delay,
        }
    }

    pub fn cache_key(&self) -> Option<&str> {
        self.config.cache_key.as_deref()
    }

    pub fn config(&self) -> &ExecutorConfig<T> {
        &self.config
    }

    pub fn cache(&self) -> &RequestCache<B> {
        &self.cache
    }

    pub fn operation(&self) -> &R {
        &self.operation
    }

    async fn lookup(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache read for {} failed, fetching instead: {}", key, e);
                None
            }
        }
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!("Cache delete for {} failed: {}", key, e);
        }
    }

    /// Success path: write-through, state, retry reset, callback.
    async fn complete(&self, generation: u64, key: Option<&str>, data: &T) {
        if !self.is_current(generation) {
            debug!("Discarding superseded response (generation {})", generation);
            return;
        }

        if let Some(key) = key {
            if let Err(e) = self
                .cache
                .set_with_ttl(key, data, self.config.cache_duration)
                .await
            {
                warn!("Cache write for {} failed: {}", key, e);
            }
        }

        if self.apply(generation, |state| state.data = Some(data.clone())) {
            self.attempt_count.store(0, Ordering::Release);
            if let Some(callback) = &self.config.on_success {
                callback(data);
            }
        }
    }

    /// Terminal failure path: error state and callback.
    fn fail(&self, generation: u64, message: &str) {
        warn!("✗ Request failed: {}", message);
        if self.apply(generation, |state| state.error = Some(message.to_string())) {
            if let Some(callback) = &self.config.on_error {
                callback(message);
            }
        }
    }

    fn set_attempts(&self, generation: u64, count: u32) {
        if self.is_live() && self.is_current(generation) {
            self.attempt_count.store(count, Ordering::Release);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        match self.config.concurrency {
            ConcurrencyPolicy::LastCompletionWins => true,
            ConcurrencyPolicy::LatestIssued => {
                self.generation.load(Ordering::Acquire) == generation
            }
        }
    }

    /// State write on behalf of call `generation`. Returns whether it happened.
    fn apply<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut RequestState<T>),
    {
        if !self.is_current(generation) {
            return false;
        }
        self.write(f)
    }

    /// State write gated only by liveness. Returns whether it happened.
    fn write<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut RequestState<T>),
    {
        if !self.is_live() {
            warn!("⚠ State write suppressed: executor disposed");
            return false;
        }
        f(&mut self.lock_state());
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, RequestState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
