//! Bazaar Cache - Client-Side Product Cache
//!
//! A lookup-aside cache for product records. Reads are served from memory
//! while the data is younger than the freshness window, and fall back to a
//! [`ProductFetcher`] otherwise.
//!
//! # Freshness
//!
//! Staleness is evaluated on every read against an injected
//! [`Clock`](bazaar_core::Clock); nothing is expired in the background. The
//! product list and each by-ID entry carry their own fetch timestamp.
//!
//! # Example
//!
//! ```ignore
//! let cache = ProductCache::new(api, Arc::new(SystemClock), CacheConfig::default());
//!
//! // Served from memory on the second call within five minutes
//! let products = cache.fetch_all(false).await?.into_value();
//! let lamp = cache.fetch_by_id(&ProductId::from("42"), false).await?;
//! if lamp.was_cache_hit() {
//!     tracing::debug!("no network call needed");
//! }
//!
//! // Logout
//! cache.clear().await;
//! ```

pub mod error;
pub mod freshness;
pub mod product_cache;
pub mod traits;

pub use error::{CacheError, CacheResult};
pub use freshness::{CacheRead, ReadSource};
pub use product_cache::{CacheConfig, ProductCache};
pub use traits::{CacheStats, ProductFetcher};
