//! Fetcher seam and statistics for the product cache.

use async_trait::async_trait;
use bazaar_core::{FetchError, Product, ProductId};

/// Source of product data on a cache miss.
///
/// The HTTP implementation lives in `bazaar-client`. Tests plug in scripted
/// fetchers.
#[async_trait]
pub trait ProductFetcher: Send + Sync {
    /// Fetch the full product listing.
    async fn fetch_all(&self) -> Result<Vec<Product>, FetchError>;

    /// Fetch a single product.
    async fn fetch_by_id(&self, id: &ProductId) -> Result<Product, FetchError>;
}

/// Counters for cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from memory.
    pub hits: u64,
    /// Reads that went to the fetcher, successful or not.
    pub misses: u64,
    /// Fetcher calls that returned an error.
    pub failures: u64,
    /// Products currently held in the by-ID map.
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
