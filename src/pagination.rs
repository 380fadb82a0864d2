//! Incremental pagination on top of [`RequestExecutor`].
//!
//! A [`PaginatedAccumulator`] fetches pages `{page, limit}` through one
//! executor and merges them into a growing, ordered item list: page 1 replaces
//! it, every later page is appended in arrival order.
//!
//! `has_more` is recomputed from the post-merge length inside the same locked
//! update that merges the items, so rapid consecutive `load_more` calls never
//! see a stale flag.

use crate::backend::{CacheBackend, InMemoryBackend};
use crate::cache::RequestCache;
use crate::config::ExecutorConfig;
use crate::envelope::ExecuteResult;
use crate::executor::RequestExecutor;
use crate::key::CacheKeyBuilder;
use crate::payload::Payload;
use crate::remote::RemoteOperation;
use crate::strategy::FetchStrategy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Arguments of one page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

/// One page as returned by the server: a bare list or `{items, total}`.
///
/// ```
/// use request_kit::PageResponse;
///
/// let bare: PageResponse<u32> = serde_json::from_str("[1, 2]").unwrap();
/// let paged: PageResponse<u32> = serde_json::from_str(r#"{"items": [1, 2], "total": 9}"#).unwrap();
///
/// assert_eq!(bare.total(), None);
/// assert_eq!(paged.total(), Some(9));
/// assert_eq!(bare.items(), paged.items());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse<I> {
    List(Vec<I>),
    Paged {
        items: Vec<I>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
    },
}

impl<I> PageResponse<I> {
    pub fn list(items: Vec<I>) -> Self {
        PageResponse::List(items)
    }

    pub fn paged(items: Vec<I>, total: Option<u64>) -> Self {
        PageResponse::Paged { items, total }
    }

    pub fn items(&self) -> &[I] {
        match self {
            PageResponse::List(items) | PageResponse::Paged { items, .. } => items,
        }
    }

    /// Total reported by the server, if any.
    pub fn total(&self) -> Option<u64> {
        match self {
            PageResponse::List(_) => None,
            PageResponse::Paged { total, .. } => *total,
        }
    }

    pub fn into_parts(self) -> (Vec<I>, Option<u64>) {
        match self {
            PageResponse::List(items) => (items, None),
            PageResponse::Paged { items, total } => (items, total),
        }
    }
}

/// Accumulated pagination state.
#[derive(Clone, Debug, PartialEq)]
pub struct PageState<I> {
    /// Last page requested.
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
    /// Items of every merged page, in arrival order.
    pub accumulated: Vec<I>,
    /// Most recent total reported by the server.
    pub total: Option<u64>,
}

impl<I> PageState<I> {
    fn new(page_size: u32) -> Self {
        PageState {
            page: 1,
            page_size,
            has_more: true,
            accumulated: Vec::new(),
            total: None,
        }
    }

    /// Merge page `page` and recompute `has_more` from the merged length.
    fn merge(&mut self, page: u32, items: Vec<I>, total: Option<u64>) {
        let fetched = items.len();

        if page == 1 {
            self.accumulated = items;
            self.total = total;
        } else {
            self.accumulated.extend(items);
            if total.is_some() {
                self.total = total;
            }
        }
        self.page = page;

        self.has_more = match self.total {
            Some(total) => (self.accumulated.len() as u64) < total,
            None => fetched > 0 && fetched >= self.page_size as usize,
        };
    }
}

/// Accumulates pages fetched through a wrapped [`RequestExecutor`].
///
/// When the executor has a cache key `K`, page `n` is cached under
/// `K:page:n:limit:size`, so pages never overwrite each other.
///
/// # Example
///
/// ```no_run
/// use request_kit::remote::from_fn;
/// use request_kit::{Envelope, ExecutorConfig, PageQuery, PageResponse, PaginatedAccumulator, RequestCache};
///
/// # async fn demo() {
/// let products = PaginatedAccumulator::new(
///     from_fn(|q: PageQuery| async move {
///         let items: Vec<u32> = ((q.page - 1) * q.limit..q.page * q.limit).collect();
///         Ok::<_, request_kit::Error>(Envelope::ok(PageResponse::paged(items, Some(50))))
///     }),
///     RequestCache::shared(),
///     ExecutorConfig::default().with_cache_key("products"),
///     10,
/// );
///
/// products.fetch_page(1).await;
/// while products.has_more() {
///     products.load_more().await;
/// }
/// assert_eq!(products.items().len(), 50);
/// # }
/// ```
pub struct PaginatedAccumulator<I, R, B = InMemoryBackend>
where
    B: CacheBackend,
{
    executor: RequestExecutor<PageQuery, PageResponse<I>, R, B>,
    state: Mutex<PageState<I>>,
    pending: AtomicBool,
    /// Bumped by `reset`; pages issued under an older epoch are not merged.
    epoch: AtomicU64,
}

/// Clears the `load_more` pending flag on every exit, drops included.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<I, R, B> PaginatedAccumulator<I, R, B>
where
    I: Payload,
    R: RemoteOperation<PageQuery, PageResponse<I>>,
    B: CacheBackend,
{
    /// Build the executor and the accumulator around it.
    pub fn new(
        operation: R,
        cache: RequestCache<B>,
        config: ExecutorConfig<PageResponse<I>>,
        page_size: u32,
    ) -> Self {
        Self::from_executor(RequestExecutor::new(operation, cache, config), page_size)
    }

    /// Wrap an existing executor. A zero `page_size` is raised to 1.
    pub fn from_executor(
        executor: RequestExecutor<PageQuery, PageResponse<I>, R, B>,
        page_size: u32,
    ) -> Self {
        if page_size == 0 {
            warn!("⚠ Page size 0 is invalid, using 1");
        }
        PaginatedAccumulator {
            executor,
            state: Mutex::new(PageState::new(page_size.max(1))),
            pending: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Fetch page 1 if the executor is configured `immediate`.
    pub async fn mount(&self) -> Option<ExecuteResult<PageResponse<I>>> {
        if !self.executor.config().immediate {
            return None;
        }
        Some(self.fetch_page(1).await)
    }

    /// Fetch page `page` and merge it.
    pub async fn fetch_page(&self, page: u32) -> ExecuteResult<PageResponse<I>> {
        self.fetch(page, FetchStrategy::CacheFirst).await
    }

    /// Fetch the next page.
    ///
    /// Returns `None` without fetching while a request is loading, while
    /// another `load_more` is pending, or once `has_more` is false. A failed
    /// fetch leaves the page counter where it was.
    pub async fn load_more(&self) -> Option<ExecuteResult<PageResponse<I>>> {
        if !self.executor.is_live() || self.executor.is_loading() || !self.has_more() {
            return None;
        }
        if self.pending.swap(true, Ordering::AcqRel) {
            debug!("load_more ignored: a page is already pending");
            return None;
        }
        let _pending = PendingGuard(&self.pending);

        let next = self.page() + 1;
        let result = self.fetch(next, FetchStrategy::CacheFirst).await;
        if !result.success {
            debug!("Page {} failed, staying on page {}", next, next - 1);
        }
        Some(result)
    }

    /// Reset, drop every cached page, then fetch page 1 from the remote.
    pub async fn refresh(&self) -> ExecuteResult<PageResponse<I>> {
        self.reset();
        self.clear_cache().await;
        self.fetch(1, FetchStrategy::Invalidate).await
    }

    /// Back to page 1 with nothing accumulated; resets the executor too.
    ///
    /// Pages still in flight from before the reset are returned to their
    /// callers but never merged.
    pub fn reset(&self) {
        let page_size = self.page_size();
        self.write(|state| {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            *state = PageState::new(page_size);
        });
        self.pending.store(false, Ordering::Release);
        self.executor.reset();
    }

    /// Drop every cached page of this accumulator.
    pub async fn clear_cache(&self) {
        let Some(key) = self.executor.cache_key() else {
            return;
        };
        let prefix = CacheKeyBuilder::page_prefix(key);
        match self.executor.cache().delete_prefix(&prefix).await {
            Ok(removed) => debug!("Cleared {} cached pages of {}", removed, key),
            Err(e) => warn!("Clearing cached pages of {} failed: {}", key, e),
        }
    }

    /// Stop all further state writes, here and in the executor.
    pub fn dispose(&self) {
        self.executor.dispose();
    }

    pub fn items(&self) -> Vec<I> {
        self.lock_state().accumulated.clone()
    }

    pub fn page_state(&self) -> PageState<I> {
        self.lock_state().clone()
    }

    pub fn has_more(&self) -> bool {
        self.lock_state().has_more
    }

    pub fn page(&self) -> u32 {
        self.lock_state().page
    }

    pub fn page_size(&self) -> u32 {
        self.lock_state().page_size
    }

    pub fn is_loading(&self) -> bool {
        self.executor.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.executor.error()
    }

    pub fn executor(&self) -> &RequestExecutor<PageQuery, PageResponse<I>, R, B> {
        &self.executor
    }

    async fn fetch(&self, page: u32, strategy: FetchStrategy) -> ExecuteResult<PageResponse<I>> {
        let epoch = self.epoch.load(Ordering::Acquire);
        let limit = self.page_size();
        let key = self
            .executor
            .cache_key()
            .map(|base| CacheKeyBuilder::page_key(base, page, limit));

        let result = self
            .executor
            .execute_keyed(PageQuery { page, limit }, key, strategy)
            .await;

        if let Some(response) = result.data.clone() {
            let (items, total) = response.into_parts();
            let count = items.len();
            let mut merged = false;
            self.write(|state| {
                if self.epoch.load(Ordering::Acquire) == epoch {
                    state.merge(page, items, total);
                    merged = true;
                }
            });
            if merged {
                debug!("✓ Merged page {} ({} items)", page, count);
            } else {
                debug!("Page {} not merged: accumulator reset or disposed", page);
            }
        }
        result
    }

    fn write<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut PageState<I>),
    {
        if !self.executor.is_live() {
            return false;
        }
        f(&mut self.lock_state());
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, PageState<I>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
