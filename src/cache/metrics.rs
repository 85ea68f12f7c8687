//! Per-instance cache hit/miss counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe hit/miss counters owned by one [`ResourceCache`](super::ResourceCache).
///
/// Counters are plain atomics — increments from concurrent lookups are
/// never lost, and reads never block. The hit ratio is derived fresh from
/// the current counters on every read, not stored.
///
/// These are the per-instance counters the cache exposes to callers (and
/// to the cached-response JSON helper). Process-wide aggregates go through
/// the `metrics` facade separately; see [`telemetry`](crate::telemetry).
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    /// Create a zeroed counter pair.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lookup served from the cached entry.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup that invoked the loader.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero both counters.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of hits recorded since creation or the last reset.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of misses recorded since creation or the last reset.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// `hits / (hits + misses)`, or `0.0` when no lookups have happened.
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Copy the current counter values into an owned snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            hit_ratio: self.hit_ratio(),
        }
    }
}

impl fmt::Display for CacheMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hits: {}, Misses: {}, Hit Ratio: {:.0}%",
            self.hits(),
            self.misses(),
            self.hit_ratio() * 100.0
        )
    }
}

/// Owned point-in-time copy of a [`CacheMetrics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
}
