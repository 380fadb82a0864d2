//! # request-kit
//!
//! A request/cache/retry/pagination engine sitting between views and a remote
//! API.
//!
//! ## Features
//!
//! - **Cache-first execution:** a shared TTL cache answers repeated requests
//!   without touching the network (5 minutes by default)
//! - **Bounded retry:** `retry_count` extra attempts spaced by a fixed delay
//! - **Uniform results:** every outcome is an [`ExecuteResult`]; failure
//!   messages resolve nested `error.message`, then `message`, then
//!   `"An error occurred"`
//! - **Liveness-guarded state:** once a view is gone its in-flight calls stop
//!   touching state
//! - **Pagination:** [`PaginatedAccumulator`] merges pages into one ordered
//!   list and tracks whether more exist
//! - **Transport agnostic:** anything implementing [`RemoteOperation`] can be
//!   executed; HTTP stays in the caller's client
//!
//! ## Quick Start
//!
//! ```ignore
//! use request_kit::{CacheAdmin, ExecutorConfig, RequestCache, RequestExecutor};
//! use std::time::Duration;
//!
//! // 1. One cache handle for the whole application
//! let cache = RequestCache::shared();
//!
//! // 2. One executor per logical request
//! let categories = RequestExecutor::new(
//!     ListCategories { http: client.clone() },
//!     cache.clone(),
//!     ExecutorConfig::default()
//!         .with_cache_key("categories")
//!         .with_retry(2, Duration::from_secs(1))
//!         .on_error(|message| toast::error(message)),
//! );
//!
//! // 3. Execute - repeated calls within five minutes come from the cache
//! let result = categories.execute(()).await;
//! if result.success {
//!     render(categories.data());
//! }
//!
//! // 4. The view goes away
//! categories.dispose();
//!
//! // 5. Logout
//! CacheAdmin::new(cache).clear_all_cache().await?;
//! ```

#[macro_use]
extern crate log;

pub mod admin;
pub mod backend;
pub mod cache;
pub mod config;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod key;
pub mod liveness;
pub mod observability;
pub mod pagination;
pub mod payload;
pub mod remote;
pub mod serialization;
pub mod strategy;

// Re-exports for convenience
pub use admin::CacheAdmin;
pub use backend::{CacheBackend, InMemoryBackend};
pub use cache::{RequestCache, DEFAULT_CACHE_DURATION};
pub use config::{ConcurrencyPolicy, ExecutorConfig, DEFAULT_RETRY_DELAY};
pub use envelope::{Envelope, ExecuteResult, DEFAULT_ERROR_MESSAGE};
pub use error::{Error, ErrorBody, RemoteFault, Result};
pub use executor::{RequestExecutor, RequestState, RetryState};
pub use liveness::LivenessToken;
pub use pagination::{PageQuery, PageResponse, PageState, PaginatedAccumulator};
pub use payload::Payload;
pub use remote::RemoteOperation;
pub use strategy::FetchStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
