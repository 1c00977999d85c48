//! Freshness checks and read metadata.
//!
//! Every read returns a [`CacheRead`] so callers can tell whether the value
//! came from memory or from the network, and how old it is.

use bazaar_core::Timestamp;
use std::time::Duration;

/// True while `now - fetched_at < window`.
///
/// A fetch stamped after `now` (clock moved backwards) counts as fresh.
pub fn is_fresh(fetched_at: Timestamp, now: Timestamp, window: Duration) -> bool {
    match now.signed_duration_since(fetched_at).to_std() {
        Ok(age) => age < window,
        Err(_) => true,
    }
}

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Cache,
    Network,
}

/// A value read through the cache, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
    fetched_at: Timestamp,
}

impl<T> CacheRead<T> {
    pub fn from_cache(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
            fetched_at,
        }
    }

    pub fn from_network(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            source: ReadSource::Network,
            fetched_at,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    /// When the underlying data was fetched from the network.
    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    /// Age of the data relative to `now`.
    pub fn age(&self, now: Timestamp) -> Duration {
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_inside_window() {
        let window = Duration::from_secs(300);
        assert!(is_fresh(t0(), t0(), window));
        assert!(is_fresh(t0(), t0() + TimeDelta::seconds(299), window));
    }

    #[test]
    fn test_stale_at_window_boundary() {
        let window = Duration::from_secs(300);
        assert!(!is_fresh(t0(), t0() + TimeDelta::seconds(300), window));
        assert!(!is_fresh(t0(), t0() + TimeDelta::minutes(6), window));
    }

    #[test]
    fn test_future_stamp_counts_as_fresh() {
        assert!(is_fresh(t0() + TimeDelta::seconds(5), t0(), Duration::from_secs(1)));
    }

    #[test]
    fn test_cache_read_age() {
        let read = CacheRead::from_cache(1u8, t0());
        assert!(read.was_cache_hit());
        assert_eq!(read.age(t0() + TimeDelta::seconds(90)), Duration::from_secs(90));
        assert_eq!(read.age(t0() - TimeDelta::seconds(1)), Duration::ZERO);
    }
}
