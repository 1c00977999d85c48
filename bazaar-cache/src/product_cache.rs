//! Product cache with a fixed freshness window.
//!
//! The cache is constructed once per application and shared by reference.
//! The state lock is never held across a fetcher call, so two concurrent
//! misses for the same product both reach the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bazaar_core::{CacheSettings, Clock, Product, ProductId, Timestamp};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::CacheResult;
use crate::freshness::{is_fresh, CacheRead};
use crate::traits::{CacheStats, ProductFetcher};

/// Configuration for the product cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long fetched data is served without a network call.
    pub freshness_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self::new().with_freshness_window(Duration::from_secs(settings.freshness_secs))
    }
}

#[derive(Debug, Clone)]
struct CachedProduct {
    product: Product,
    fetched_at: Timestamp,
}

#[derive(Debug, Default)]
struct CacheState {
    products: Vec<Product>,
    list_fetched_at: Option<Timestamp>,
    by_id: HashMap<ProductId, CachedProduct>,
}

/// Lookup-aside cache for product records.
pub struct ProductCache<F: ProductFetcher> {
    fetcher: F,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    state: RwLock<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

impl<F: ProductFetcher> ProductCache<F> {
    pub fn new(fetcher: F, clock: Arc<dyn Clock>, config: CacheConfig) -> Self {
        Self {
            fetcher,
            clock,
            config,
            state: RwLock::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Return the product list, fetching it when the cached copy is empty,
    /// stale, or `force_refresh` is set.
    ///
    /// A successful fetch replaces the list and merges every item into the
    /// by-ID map (last write wins). A failed fetch leaves everything as it was.
    pub async fn fetch_all(&self, force_refresh: bool) -> CacheResult<CacheRead<Vec<Product>>> {
        if !force_refresh {
            let now = self.clock.now();
            let state = self.state.read().await;
            if let Some(fetched_at) = state.list_fetched_at {
                if !state.products.is_empty()
                    && is_fresh(fetched_at, now, self.config.freshness_window)
                {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(count = state.products.len(), "product list served from cache");
                    return Ok(CacheRead::from_cache(state.products.clone(), fetched_at));
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(force_refresh, "fetching product list");
        let products = self.fetcher.fetch_all().await.map_err(|err| {
            self.failures.fetch_add(1, Ordering::Relaxed);
            warn!(error = %err, "product list fetch failed; keeping cached data");
            err
        })?;

        let fetched_at = self.clock.now();
        let mut state = self.state.write().await;
        for product in &products {
            state.by_id.insert(
                product.id.clone(),
                CachedProduct {
                    product: product.clone(),
                    fetched_at,
                },
            );
        }
        state.products = products.clone();
        state.list_fetched_at = Some(fetched_at);

        Ok(CacheRead::from_network(products, fetched_at))
    }

    /// Return a single product under the same freshness rule as [`fetch_all`].
    ///
    /// [`fetch_all`]: ProductCache::fetch_all
    pub async fn fetch_by_id(
        &self,
        id: &ProductId,
        force_refresh: bool,
    ) -> CacheResult<CacheRead<Product>> {
        if !force_refresh {
            let now = self.clock.now();
            let state = self.state.read().await;
            if let Some(entry) = state.by_id.get(id) {
                if is_fresh(entry.fetched_at, now, self.config.freshness_window) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(product_id = %id, "product served from cache");
                    return Ok(CacheRead::from_cache(entry.product.clone(), entry.fetched_at));
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(product_id = %id, force_refresh, "fetching product");
        let product = self.fetcher.fetch_by_id(id).await.map_err(|err| {
            self.failures.fetch_add(1, Ordering::Relaxed);
            warn!(product_id = %id, error = %err, "product fetch failed; keeping cached data");
            err
        })?;

        let fetched_at = self.clock.now();
        let mut state = self.state.write().await;
        state.by_id.insert(
            id.clone(),
            CachedProduct {
                product: product.clone(),
                fetched_at,
            },
        );

        Ok(CacheRead::from_network(product, fetched_at))
    }

    /// Drop one product from the by-ID map. The list is left alone.
    pub async fn invalidate(&self, id: &ProductId) -> bool {
        self.state.write().await.by_id.remove(id).is_some()
    }

    /// Empty the list and the by-ID map and forget every fetch timestamp.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = CacheState::default();
        debug!("product cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.state.read().await.by_id.len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries,
        }
    }
}
