//! Basic usage example of the request engine.

use request_kit::remote::from_fn;
use request_kit::{
    error::Result, CacheAdmin, Envelope, Error, ExecutorConfig, PageQuery, PageResponse,
    PaginatedAccumulator, RemoteFault, RemoteOperation, RequestCache, RequestExecutor,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Example payload: Category
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Category {
    id: u32,
    name: String,
}

/// Fake API endpoint that fails its first call.
struct CategoryApi {
    calls: AtomicU32,
}

impl RemoteOperation<(), Vec<Category>> for CategoryApi {
    async fn call(&self, _args: ()) -> Result<Envelope<Vec<Category>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        println!("  [API] GET /categories (call #{})", call);

        if call == 1 {
            return Err(RemoteFault::new()
                .with_status(502)
                .with_message("Bad gateway")
                .into());
        }

        Ok(Envelope::ok(vec![
            Category {
                id: 1,
                name: "Books".to_string(),
            },
            Category {
                id: 2,
                name: "Games".to_string(),
            },
        ]))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Request Kit - Basic Example ===\n");

    // 1. One cache for the application
    println!("1. Initializing shared cache...");
    let cache = RequestCache::shared();
    println!("   ✓ Cache ready\n");

    // 2. First execute - fails once, retried, then cached
    println!("2. Executing categories request (retry 2 x 200ms):");
    let categories = RequestExecutor::new(
        CategoryApi {
            calls: AtomicU32::new(0),
        },
        cache.clone(),
        ExecutorConfig::default()
            .with_cache_key("categories")
            .with_retry(2, Duration::from_millis(200))
            .on_success(|data: &Vec<Category>| println!("   ✓ on_success: {} categories", data.len()))
            .on_error(|message| println!("   ✗ on_error: {}", message)),
    );

    let result = categories.execute(()).await;
    println!(
        "   ✓ success: {}, from cache: {}\n",
        result.success, result.from_cache
    );

    // 3. Second execute - served from cache
    println!("3. Executing again (within TTL):");
    let result = categories.execute(()).await;
    println!("   ✓ from cache: {}\n", result.from_cache);

    // 4. Refetch - drops the entry and calls the API
    println!("4. Refetch:");
    let result = categories.refetch(()).await;
    println!("   ✓ from cache: {}\n", result.from_cache);

    // 5. Failure message resolution
    println!("5. Failing request:");
    let broken = RequestExecutor::new(
        from_fn(|id: u32| async move {
            Ok::<_, Error>(Envelope::<Category>::fail(format!("Category {} not found", id)))
        }),
        cache.clone(),
        ExecutorConfig::default(),
    );
    let result = broken.execute(42).await;
    println!("   ✓ error: {:?}\n", result.error_message());

    // 6. Pagination
    println!("6. Paginated products (page size 3):");
    let products = PaginatedAccumulator::new(
        from_fn(|query: PageQuery| async move {
            let start = (query.page - 1) * query.limit;
            let items: Vec<u32> = (start..(start + query.limit).min(8)).collect();
            Ok::<_, Error>(Envelope::ok(PageResponse::paged(items, Some(8))))
        }),
        cache.clone(),
        ExecutorConfig::default().with_cache_key("products"),
        3,
    );
    products.fetch_page(1).await;
    while products.has_more() {
        products.load_more().await;
        println!("   page {}: {:?}", products.page(), products.items());
    }
    println!("   ✓ {} products loaded\n", products.items().len());

    // 7. View goes away, then logout
    println!("7. Dispose and logout:");
    categories.dispose();
    products.dispose();
    let admin = CacheAdmin::new(cache);
    println!("   entries before logout: {}", admin.stats().total_entries);
    admin.clear_all_cache().await?;
    println!("   ✓ entries after logout: {}\n", admin.stats().total_entries);

    Ok(())
}
