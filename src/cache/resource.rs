//! Single-flight TTL cache for expensive external-process results.
//!
//! [`ResourceCache<T>`] owns one cached value of an expensive async load
//! (an external tool query, out of scope here) and guarantees that however
//! many callers observe the cache as absent or expired at the same moment,
//! the loader runs **exactly once** — everyone else waits on the load lock
//! and reuses the published result. This is the stampede protection the
//! gateway relies on for read-mostly queries (SDK list, template list).
//!
//! # Architecture
//!
//! Two locks with distinct jobs:
//!
//! - `entry: std::sync::RwLock<Option<CachedEntry<T>>>` — the publish slot.
//!   Held only for non-async reads/writes, never across an `.await`.
//! - `load_lock: tokio::sync::Mutex<()>` — serialises load-and-publish.
//!   Acquisition is async and cancellable.
//!
//! The fast path (fresh entry, no forced reload) touches only the read
//! side of the slot, so it completes immediately even while another caller
//! holds the load lock for a slow refresh. The slow path re-checks the
//! slot after acquiring the load lock (double-checked pattern): a caller
//! that queued behind a refresh reuses the freshly published entry instead
//! of loading again.
//!
//! Instances are independent — one per cached resource kind, owned by
//! whoever composes the gateway. There is no global cache state.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::metrics::{CacheMetrics, MetricsSnapshot};
use crate::telemetry;
use crate::{DotgateError, Result};

/// Default time-to-live for cached entries when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// One cached value with its publish time and lifetime.
///
/// Created on a successful load, replaced wholesale on reload, never
/// mutated in place.
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
    data: T,
    cached_at: Instant,
    cache_duration: Duration,
}

impl<T> CachedEntry<T> {
    fn new(data: T, cache_duration: Duration) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
            cache_duration,
        }
    }

    /// Whether the entry has outlived its TTL at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.cached_at) >= self.cache_duration
    }

    /// Time elapsed since the entry was published.
    pub fn age(&self, now: Instant) -> Duration {
        now.duration_since(self.cached_at)
    }
}

/// Outcome of a [`ResourceCache::get_or_load`] call.
///
/// Carries the value together with the metadata the cached-response JSON
/// helper needs (`hit`, entry age).
#[derive(Debug, Clone)]
pub struct CacheLookup<T> {
    /// The cached or freshly loaded value.
    pub value: T,
    /// `true` when served from the cached entry without invoking the loader.
    pub hit: bool,
    /// Age of the entry the value came from (zero for a fresh load).
    pub age: Duration,
}

/// Single-flight TTL cache around one expensive async load.
///
/// Generic over the payload type; `T: Clone` because every caller gets its
/// own copy of the published value. Disposed explicitly — all operations
/// fail with [`DotgateError::Disposed`] afterwards.
pub struct ResourceCache<T> {
    name: String,
    ttl: Duration,
    entry: RwLock<Option<CachedEntry<T>>>,
    load_lock: tokio::sync::Mutex<()>,
    metrics: CacheMetrics,
    disposed: AtomicBool,
}

impl<T: Clone> ResourceCache<T> {
    /// Create a cache with the default TTL (300 s).
    ///
    /// `name` identifies the resource kind in diagnostics and telemetry
    /// labels (e.g. `"sdk_list"`).
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_ttl(name, DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            entry: RwLock::new(None),
            load_lock: tokio::sync::Mutex::new(()),
            metrics: CacheMetrics::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Resource name this cache was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value, loading it if absent, expired, or
    /// `force_reload` is set.
    ///
    /// - Fast path: a fresh entry is returned immediately without touching
    ///   the load lock, and a hit is recorded.
    /// - Slow path: acquires the per-instance load lock (cancellable),
    ///   re-checks the entry under the lock, and only then invokes
    ///   `loader`. The result is published before the lock is released,
    ///   so queued callers observe it in their re-check.
    ///
    /// Cancellation while waiting for the lock or while the loader runs
    /// surfaces as [`DotgateError::Cancelled`]; the lock never leaks and
    /// no partial entry is published.
    pub async fn get_or_load<F, Fut>(
        &self,
        loader: F,
        force_reload: bool,
        cancel: &CancellationToken,
    ) -> Result<CacheLookup<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.ensure_live()?;

        if !force_reload {
            if let Some(lookup) = self.try_fast_path() {
                return Ok(lookup);
            }
        }

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DotgateError::Cancelled),
            guard = self.load_lock.lock() => guard,
        };
        // The instance may have been disposed while this caller waited.
        self.ensure_live()?;

        // Double-check under the lock: another caller may have refreshed
        // the entry while this one queued.
        if !force_reload {
            if let Some(lookup) = self.try_fast_path() {
                return Ok(lookup);
            }
        }

        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DotgateError::Cancelled),
            loaded = loader() => loaded?,
        };

        self.publish(data.clone());
        self.metrics.record_miss();
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "resource" => self.name.clone())
            .increment(1);
        debug!(resource = %self.name, ttl_secs = self.ttl.as_secs(), "cache entry refreshed");

        Ok(CacheLookup {
            value: data,
            hit: false,
            age: Duration::ZERO,
        })
    }

    /// Clear the cached entry and reset metrics to zero.
    ///
    /// Acquires the load lock first, so a clear cannot race an in-progress
    /// load-and-publish. Honors cancellation while waiting for the lock.
    pub async fn clear(&self, cancel: &CancellationToken) -> Result<()> {
        self.ensure_live()?;

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DotgateError::Cancelled),
            guard = self.load_lock.lock() => guard,
        };
        self.ensure_live()?;

        *self.slot_write() = None;
        self.metrics.reset();
        debug!(resource = %self.name, "cache cleared");
        Ok(())
    }

    /// Zero the hit/miss counters without touching the cached entry.
    pub fn reset_metrics(&self) -> Result<()> {
        self.ensure_live()?;
        self.metrics.reset();
        Ok(())
    }

    /// Point-in-time copy of the per-instance counters.
    pub fn metrics(&self) -> Result<MetricsSnapshot> {
        self.ensure_live()?;
        Ok(self.metrics.snapshot())
    }

    /// Dispose the cache. Idempotent; every subsequent operation fails
    /// with [`DotgateError::Disposed`].
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            *self.slot_write() = None;
            debug!(resource = %self.name, "cache disposed");
        }
    }

    /// Whether [`dispose()`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(DotgateError::Disposed(self.name.clone()))
        } else {
            Ok(())
        }
    }

    /// Serve a fresh entry without the load lock, recording a hit.
    fn try_fast_path(&self) -> Option<CacheLookup<T>> {
        let now = Instant::now();
        let slot = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        let entry = slot.as_ref().filter(|e| !e.is_expired(now))?;

        self.metrics.record_hit();
        metrics::counter!(telemetry::CACHE_HITS_TOTAL, "resource" => self.name.clone())
            .increment(1);
        Some(CacheLookup {
            value: entry.data.clone(),
            hit: true,
            age: entry.age(now),
        })
    }

    fn publish(&self, data: T) {
        *self.slot_write() = Some(CachedEntry::new(data, self.ttl));
    }

    fn slot_write(&self) -> std::sync::RwLockWriteGuard<'_, Option<CachedEntry<T>>> {
        self.entry.write().unwrap_or_else(PoisonError::into_inner)
    }
}
