//! Integration tests for request-kit
//!
//! These tests drive executors, the shared cache and the admin surface end to
//! end, the way a view layer would.

use request_kit::remote::{from_fn, ScriptedOperation, Step};
use request_kit::{
    CacheAdmin, ConcurrencyPolicy, Envelope, Error, ExecutorConfig, LivenessToken, RemoteFault,
    RequestCache, RequestExecutor, DEFAULT_ERROR_MESSAGE,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct Category {
    id: u32,
    name: String,
}

fn categories() -> Vec<Category> {
    vec![
        Category {
            id: 1,
            name: "Books".to_string(),
        },
        Category {
            id: 2,
            name: "Games".to_string(),
        },
    ]
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Remote operation counting its invocations.
fn counting_operation(
    calls: Arc<AtomicUsize>,
) -> impl request_kit::RemoteOperation<(), Vec<Category>> {
    from_fn(move |_: ()| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Error>(Envelope::ok(categories()))
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_ttl_window_controls_remote_invocation() {
    init_logging();
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = RequestCache::in_memory();
    let executor = RequestExecutor::new(
        counting_operation(calls.clone()),
        cache,
        ExecutorConfig::default()
            .with_cache_key("categories")
            .with_cache_duration(Duration::from_secs(60)),
    );

    let first = executor.execute(()).await;
    assert!(first.success);
    assert!(!first.from_cache);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(59)).await;
    let hit = executor.execute(()).await;
    assert!(hit.from_cache);
    assert_eq!(hit.data, Some(categories()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    let expired = executor.execute(()).await;
    assert!(!expired.from_cache);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_executors_share_cache_entries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = RequestCache::in_memory();
    let a = RequestExecutor::new(
        counting_operation(calls.clone()),
        cache.clone(),
        ExecutorConfig::default().with_cache_key("X"),
    );
    let b = RequestExecutor::new(
        counting_operation(calls.clone()),
        cache.clone(),
        ExecutorConfig::default().with_cache_key("X"),
    );

    a.execute(()).await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let result = b.execute(()).await;

    assert!(result.success);
    assert!(result.from_cache);
    assert_eq!(b.data(), Some(categories()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_retries_exactly() {
    init_logging();
    let op = Arc::new(
        ScriptedOperation::<(), Vec<Category>>::new()
            .otherwise(Step::fault(RemoteFault::new().with_status(503))),
    );
    let executor = RequestExecutor::new(
        op.clone(),
        RequestCache::in_memory(),
        ExecutorConfig::default().with_retry(3, Duration::from_millis(750)),
    );

    let result = executor.execute(()).await;

    assert!(!result.success);
    assert_eq!(op.call_count(), 4);
    let calls = op.calls();
    for pair in calls.windows(2) {
        assert!(pair[1].at.duration_since(pair[0].at) >= Duration::from_millis(750));
    }
    // A bare status carries no message of its own.
    assert_eq!(executor.error().as_deref(), Some(DEFAULT_ERROR_MESSAGE));
    assert!(!executor.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_fail_once_then_succeed() {
    let op = Arc::new(
        ScriptedOperation::<(), Vec<Category>>::new()
            .then(Step::fault(Error::Transport("connection reset".to_string())))
            .then_ok(categories())
            .then_fail("first")
            .then_fail("second")
            .then_fail("third"),
    );
    let executor = RequestExecutor::new(
        op.clone(),
        RequestCache::in_memory(),
        ExecutorConfig::default().with_retry(2, Duration::from_millis(100)),
    );

    let recovered = executor.execute(()).await;
    assert!(recovered.success);
    assert_eq!(op.call_count(), 2);
    assert_eq!(executor.retry_state().attempt_count, 0);

    // A fresh failure chain gets the full retry budget again.
    let failed = executor.execute(()).await;
    assert!(!failed.success);
    assert_eq!(failed.error_message(), Some("third"));
    assert_eq!(op.call_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_disposal_freezes_state() {
    let token = LivenessToken::new();
    let op = Arc::new(ScriptedOperation::<(), Vec<Category>>::new().then(
        Step::respond(Envelope::ok(categories())).after(Duration::from_secs(5)),
    ));
    let errors = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = errors.clone();
    let executor = RequestExecutor::new(
        op,
        RequestCache::in_memory(),
        ExecutorConfig::default()
            .with_liveness(token.clone())
            .on_error(move |m| sink.lock().unwrap().push(m.to_string())),
    );

    let (result, snapshot) = tokio::join!(executor.execute(()), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = executor.state();
        // The owning view goes away.
        token.dispose();
        snapshot
    });

    assert!(result.success);
    assert_eq!(executor.state(), snapshot);
    assert!(executor.data().is_none());
    assert!(errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_all_cache_on_logout() {
    let cache = RequestCache::in_memory();
    let executor = RequestExecutor::new(
        counting_operation(Arc::new(AtomicUsize::new(0))),
        cache.clone(),
        ExecutorConfig::default().with_cache_key("categories"),
    );
    executor.execute(()).await;
    cache.set("profile", &"ana".to_string()).await.expect("set");

    CacheAdmin::new(cache.clone())
        .clear_all_cache()
        .await
        .expect("clear");

    assert!(cache
        .get::<Vec<Category>>("categories")
        .await
        .expect("get")
        .is_none());
    assert!(cache.get::<String>("profile").await.expect("get").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_latest_issued_discards_stale_response() {
    let op = Arc::new(
        ScriptedOperation::<u32, Vec<Category>>::new()
            .then(Step::respond(Envelope::ok(vec![])).after(Duration::from_secs(4)))
            .then(Step::respond(Envelope::ok(categories())).after(Duration::from_secs(1))),
    );
    let successes = Arc::new(AtomicUsize::new(0));
    let counter = successes.clone();
    let executor = RequestExecutor::new(
        op.clone(),
        RequestCache::in_memory(),
        ExecutorConfig::default()
            .with_concurrency(ConcurrencyPolicy::LatestIssued)
            .on_success(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
    );

    let (stale, latest) = tokio::join!(executor.execute(1), executor.execute(2));

    assert_eq!(stale.data, Some(vec![]));
    assert_eq!(latest.data, Some(categories()));
    assert_eq!(executor.data(), Some(categories()));
    assert_eq!(successes.load(Ordering::SeqCst), 1);
    let args: Vec<u32> = op.calls().into_iter().map(|c| c.args).collect();
    assert_eq!(args, vec![1, 2]);
}

#[tokio::test]
async fn test_many_executors_one_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = RequestCache::in_memory();
    let first = RequestExecutor::new(
        counting_operation(calls.clone()),
        cache.clone(),
        ExecutorConfig::default().with_cache_key("categories"),
    );
    first.execute(()).await;

    let executors: Vec<_> = (0..8)
        .map(|_| {
            RequestExecutor::new(
                counting_operation(calls.clone()),
                cache.clone(),
                ExecutorConfig::default().with_cache_key("categories"),
            )
        })
        .collect();

    let results = futures::future::join_all(executors.iter().map(|e| e.execute(()))).await;

    assert!(results.iter().all(|r| r.success && r.from_cache));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refetch_overwrites_cached_entry() {
    let op = Arc::new(
        ScriptedOperation::<(), Vec<Category>>::new()
            .then_ok(vec![])
            .then_ok(categories()),
    );
    let cache = RequestCache::in_memory();
    let executor = RequestExecutor::new(
        op.clone(),
        cache.clone(),
        ExecutorConfig::default().with_cache_key("categories"),
    );

    executor.execute(()).await;
    let refreshed = executor.refetch(()).await;

    assert!(!refreshed.from_cache);
    let cached: Option<Vec<Category>> = cache.get("categories").await.expect("get");
    assert_eq!(cached, Some(categories()));
    assert_eq!(op.call_count(), 2);
}
