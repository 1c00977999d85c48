//! Freshness and failure properties of `ProductCache` over a mock fetcher.

use std::sync::Arc;
use std::time::Duration;

use bazaar_test_utils::fixtures::sample_product;
use bazaar_test_utils::generators::{arb_catalog, arb_product_id};
use bazaar_test_utils::{
    CacheConfig, FetchError, ManualClock, MockProductFetcher, Product, ProductCache,
};
use proptest::prelude::*;

const WINDOW_SECS: u64 = 300;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn cache_over(catalog: Vec<Product>) -> (ProductCache<MockProductFetcher>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let cache = ProductCache::new(
        MockProductFetcher::new(catalog),
        clock.clone(),
        CacheConfig::default().with_freshness_window(Duration::from_secs(WINDOW_SECS)),
    );
    (cache, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_by_id_stale_exactly_at_window(id in arb_product_id(), offset in 0u64..900) {
        let product = Product::new(id.clone());
        let (cache, clock) = cache_over(vec![product]);
        let rt = runtime();

        rt.block_on(cache.fetch_by_id(&id, false)).unwrap();
        clock.advance(Duration::from_secs(offset));
        let read = rt.block_on(cache.fetch_by_id(&id, false)).unwrap();

        let expect_network = offset >= WINDOW_SECS;
        prop_assert_eq!(read.was_cache_hit(), !expect_network);
        prop_assert_eq!(cache.fetcher().by_id_calls(), if expect_network { 2 } else { 1 });
    }

    #[test]
    fn prop_force_refresh_always_fetches(catalog in arb_catalog(6), offset in 0u64..600) {
        let (cache, clock) = cache_over(catalog.clone());
        let rt = runtime();

        rt.block_on(cache.fetch_all(false)).unwrap();
        clock.advance(Duration::from_secs(offset));

        let renamed: Vec<Product> = catalog
            .iter()
            .map(|p| p.clone().with_field("name", serde_json::json!("renamed")))
            .collect();
        cache.fetcher().set_catalog(renamed.clone());

        let read = rt.block_on(cache.fetch_all(true)).unwrap();
        prop_assert!(!read.was_cache_hit());
        prop_assert_eq!(read.value(), &renamed);
        prop_assert_eq!(cache.fetcher().list_calls(), 2);

        for product in &renamed {
            let cached = rt.block_on(cache.fetch_by_id(&product.id, false)).unwrap();
            prop_assert!(cached.was_cache_hit());
            prop_assert_eq!(cached.value().name(), Some("renamed"));
        }
        prop_assert_eq!(cache.fetcher().by_id_calls(), 0);
    }

    #[test]
    fn prop_failed_fetch_keeps_cache(catalog in arb_catalog(6), status in 400u16..600) {
        let (cache, clock) = cache_over(catalog.clone());
        let rt = runtime();

        let first = rt.block_on(cache.fetch_all(false)).unwrap();
        clock.advance(Duration::from_secs(WINDOW_SECS + 1));

        cache.fetcher().fail_next(FetchError::with_status(status, "Service unavailable"));
        let err = rt.block_on(cache.fetch_all(false)).unwrap_err();
        prop_assert_eq!(err.status(), Some(status));

        // Rewind: the surviving list still carries its original timestamp.
        clock.set(first.fetched_at());
        let again = rt.block_on(cache.fetch_all(false)).unwrap();
        prop_assert!(again.was_cache_hit());
        prop_assert_eq!(again.fetched_at(), first.fetched_at());
        prop_assert_eq!(again.value(), &catalog);
    }
}

#[tokio::test]
async fn test_clear_then_cold_reads() {
    let (cache, _clock) = cache_over(vec![sample_product(1, "Lamp"), sample_product(2, "Rug")]);

    cache.fetch_all(false).await.unwrap();
    cache.clear().await;

    assert!(!cache.fetch_all(false).await.unwrap().was_cache_hit());
    cache.clear().await;
    let id = sample_product(2, "Rug").id;
    assert!(!cache.fetch_by_id(&id, false).await.unwrap().was_cache_hit());

    assert_eq!(cache.fetcher().list_calls(), 2);
    assert_eq!(cache.fetcher().by_id_calls(), 1);
}

#[tokio::test]
async fn test_unknown_id_propagates_not_found() {
    let (cache, _clock) = cache_over(vec![sample_product(1, "Lamp")]);
    let err = cache
        .fetch_by_id(&sample_product(9, "Ghost").id, false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Product not found");
    assert_eq!(cache.stats().await.failures, 1);
}
