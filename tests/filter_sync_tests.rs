//! Scenario Tests for Filter Sync and Read-Through Caching
//!
//! Drives whole flows across the cache, the router and the synchronizer the
//! way a listing page would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use filter_cache::cache::{KeyedCache, PersistedValue, ReadThroughCache, Source};
use filter_cache::error::CacheError;
use filter_cache::filters::{
    pools_schema, scope_key, FilterSchema, FilterSet, FilterSync, FilterUpdate, FilterValue,
    MemoryRouter, QueryParams, QueryRouter, POOLS_SCOPE,
};
use filter_cache::store::{FileStore, MemoryStore};

// == Helper Functions ==

fn cache() -> KeyedCache {
    KeyedCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(86_400))
}

/// The listing defaults used throughout these scenarios.
fn listing_schema() -> FilterSchema {
    FilterSchema::new()
        .int("chainId", None)
        .text("sortBy", Some("tvl"))
        .int("limit", Some(50))
        .int("offset", Some(0))
        .companion("offset")
}

fn filter_set(entries: &[(&str, Option<FilterValue>)]) -> FilterSet {
    let mut set = FilterSet::default();
    for (name, value) in entries {
        set.insert(*name, value.clone());
    }
    set
}

async fn next_change(sync: &mut FilterSync) -> FilterSet {
    tokio::time::timeout(Duration::from_secs(1), sync.next_external_change())
        .await
        .expect("no URL change observed")
        .expect("router dropped")
        .clone()
}

// == End-to-End Scenario ==

#[test]
fn test_listing_page_scenario() {
    let cache = cache();
    let router = Arc::new(MemoryRouter::from_query("chainId=137&limit=20"));

    let mut sync =
        FilterSync::mount(listing_schema(), cache.clone(), "filters:listing", router.clone());

    assert_eq!(
        sync.filters(),
        &filter_set(&[
            ("chainId", Some(FilterValue::Int(137))),
            ("sortBy", Some(FilterValue::from("tvl"))),
            ("limit", Some(FilterValue::Int(20))),
            ("offset", Some(FilterValue::Int(0))),
        ])
    );

    sync.update(FilterUpdate::new().set("sortBy", "apr"));

    let expected = filter_set(&[
        ("chainId", Some(FilterValue::Int(137))),
        ("sortBy", Some(FilterValue::from("apr"))),
        ("limit", Some(FilterValue::Int(20))),
        ("offset", Some(FilterValue::Int(0))),
    ]);
    assert_eq!(sync.filters(), &expected);
    assert_eq!(router.query().to_string(), "chainId=137&sortBy=apr&limit=20");

    let persisted = PersistedValue::<FilterSet>::new(cache, "filters:listing");
    assert_eq!(persisted.get(), Some(expected));
}

#[test]
fn test_url_wins_over_cache_and_defaults() {
    let cache = cache();
    let schema = FilterSchema::new().int("limit", Some(10));
    PersistedValue::new(cache.clone(), "filters:precedence")
        .set(&filter_set(&[("limit", Some(FilterValue::Int(50)))]));

    let router = Arc::new(MemoryRouter::from_query("limit=20"));
    let sync = FilterSync::mount(schema, cache, "filters:precedence", router);

    assert_eq!(sync.filters().int("limit"), Some(20));
}

#[test]
fn test_returning_visit_restores_cached_filters() {
    let cache = cache();

    {
        let router = Arc::new(MemoryRouter::default());
        let mut sync =
            FilterSync::mount(pools_schema(), cache.clone(), scope_key(POOLS_SCOPE), router);
        sync.update(
            FilterUpdate::new()
                .set("protocol", "uniswap-v3")
                .set("chainId", FilterValue::Int(10)),
        );
    }

    let router = Arc::new(MemoryRouter::default());
    let sync =
        FilterSync::mount(pools_schema(), cache, scope_key(POOLS_SCOPE), router.clone());

    assert_eq!(sync.filters().text("protocol"), Some("uniswap-v3"));
    assert_eq!(sync.filters().int("chainId"), Some(10));
    // Mounting restores memory only; the URL stays as it was
    assert!(router.query().is_empty());
}

// == Eventual Consistency ==

#[test]
fn test_rapid_updates_settle_consistently() {
    let cache = cache();
    let router = Arc::new(MemoryRouter::from_query("tab=pools"));

    let mut writer =
        FilterSync::mount(listing_schema(), cache.clone(), "filters:listing", router.clone());
    let mut reader =
        FilterSync::mount(listing_schema(), cache.clone(), "filters:listing", router.clone());

    for chain in [1, 10, 56, 137, 42161] {
        writer.update(FilterUpdate::new().set("chainId", FilterValue::Int(chain)));
    }
    writer.update(FilterUpdate::new().set("offset", FilterValue::Int(100)));

    // An unrelated navigation lands right after the burst
    let mut query = router.query();
    query.set("tab", "positions");
    router.navigate(query);

    assert!(reader.sync_from_url());
    // The writer already holds everything the URL now says
    assert!(!writer.sync_from_url());

    let settled = writer.filters().clone();
    assert_eq!(settled.int("chainId"), Some(42161));
    assert_eq!(settled.int("offset"), Some(100));
    assert_eq!(reader.filters(), &settled);

    let persisted = PersistedValue::<FilterSet>::new(cache.clone(), "filters:listing").get();
    assert_eq!(persisted.as_ref(), Some(&settled));
    assert_eq!(router.query().to_string(), "chainId=42161&offset=100&tab=positions");

    // A fresh mount agrees with both
    let fresh = FilterSync::mount(listing_schema(), cache, "filters:listing", router);
    assert_eq!(fresh.filters(), &settled);
}

// == History Navigation ==

#[tokio::test]
async fn test_back_and_forward_navigation() {
    let cache = cache();
    let router = Arc::new(MemoryRouter::from_query("chainId=1"));
    let mut sync =
        FilterSync::mount(listing_schema(), cache.clone(), "filters:listing", router.clone());

    // Own updates replace the current history entry
    sync.update(FilterUpdate::new().set("chainId", FilterValue::Int(137)));
    assert_eq!(router.history_len(), 1);

    router.navigate(QueryParams::parse("chainId=10&sortBy=apr"));
    let filters = next_change(&mut sync).await;
    assert_eq!(filters.int("chainId"), Some(10));
    assert_eq!(filters.text("sortBy"), Some("apr"));

    assert!(router.back());
    let filters = next_change(&mut sync).await;
    assert_eq!(filters.int("chainId"), Some(137));

    assert!(router.forward());
    let filters = next_change(&mut sync).await;
    assert_eq!(filters.int("chainId"), Some(10));
    assert!(!router.forward());

    let persisted = PersistedValue::<FilterSet>::new(cache, "filters:listing").get();
    assert_eq!(persisted.and_then(|f| f.int("chainId")), Some(10));
}

// == Fetch De-duplication ==

#[tokio::test]
async fn test_refetch_burst_writes_once() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let pools = ReadThroughCache::from_fn(cache.clone(), "pools:137", move |_cancel| {
        let call = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if call == 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, anyhow::Error>(vec!["stale".to_string()])
            } else {
                Ok(vec!["0xabc".to_string(), "0xdef".to_string()])
            }
        }
    });

    let (first, second) = tokio::join!(pools.refetch(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        pools.refetch().await
    });

    assert!(matches!(first, Err(CacheError::Cancelled(_))));
    assert_eq!(second.unwrap(), vec!["0xabc".to_string(), "0xdef".to_string()]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Give the superseded fetch time to have resolved
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.stats().writes, 1);
    assert_eq!(
        cache.read::<Vec<String>>("pools:137"),
        Some(vec!["0xabc".to_string(), "0xdef".to_string()])
    );

    let state = pools.state().await;
    assert!(!state.loading);
    assert!(state.error.is_none());
}

// == Fallback ==

#[test]
fn test_fallback_is_cached_and_reported() {
    let cache = cache();

    let resolved = tokio_test::block_on(cache.get_or_fetch(
        "chains",
        || async { Err::<Vec<i64>, _>(anyhow::anyhow!("rpc unavailable")) },
        Some(vec![1]),
    ))
    .unwrap();

    assert_eq!(resolved.value, vec![1]);
    assert_eq!(resolved.fallback_error(), Some("rpc unavailable"));

    let resolved = tokio_test::block_on(cache.get_or_fetch(
        "chains",
        || async { Ok::<Vec<i64>, anyhow::Error>(vec![1, 137]) },
        None,
    ))
    .unwrap();

    assert_eq!(resolved.source, Source::Cache);
    assert_eq!(resolved.value, vec![1]);
}

// == Durable Store ==

#[test]
fn test_file_backed_scope_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let cache = KeyedCache::new(Arc::new(FileStore::open(&path)), Duration::from_secs(86_400));
        let router = Arc::new(MemoryRouter::default());
        let mut sync = FilterSync::mount(pools_schema(), cache, scope_key(POOLS_SCOPE), router);
        sync.update(FilterUpdate::new().set("token", "usdc").set("sortBy", "volume"));
    }

    let cache = KeyedCache::new(Arc::new(FileStore::open(&path)), Duration::from_secs(86_400));
    let sync = FilterSync::mount(
        pools_schema(),
        cache,
        scope_key(POOLS_SCOPE),
        Arc::new(MemoryRouter::default()),
    );

    assert_eq!(sync.filters().text("token"), Some("usdc"));
    assert_eq!(sync.filters().text("sortBy"), Some("volume"));
    assert_eq!(sync.filters().int("limit"), Some(50));
}
