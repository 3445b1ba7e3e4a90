//! Locale resolution metrics.
//!
//! Counters for the bounded resolution cache and for lookups that ended
//! without a supported locale.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolution counters, owned by a `LocaleResolver`.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    /// Number of resolutions answered from the cache
    cache_hits: AtomicUsize,

    /// Number of resolutions computed and inserted into the cache
    cache_misses: AtomicUsize,

    /// Number of resolutions that found no supported locale
    not_supported: AtomicUsize,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup that ended in `NotSupported`.
    pub fn record_not_supported(&self) {
        self.not_supported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn not_supported(&self) -> usize {
        self.not_supported.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self, cache_len: usize, cache_capacity: usize) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total = hits + misses;
        let cache_hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            cache_len,
            cache_capacity,
            not_supported: self.not_supported(),
        }
    }
}

/// Snapshot of the resolver's counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Number of cache hits
    pub cache_hits: usize,

    /// Number of cache misses
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    /// Entries currently held in the cache
    pub cache_len: usize,

    /// Maximum number of cache entries
    pub cache_capacity: usize,

    /// Number of lookups with no supported locale
    pub not_supported: usize,
}
