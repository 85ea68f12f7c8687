//! Caching subsystem.
//!
//! One [`ResourceCache`] per distinct cached resource kind (SDK list,
//! runtime list, installed templates, …); instances are independent and
//! explicitly owned by whoever composes the gateway — there are no
//! process-wide cache singletons.
//!
//! - [`ResourceCache`] — single-flight TTL cache: at most one concurrent
//!   loader invocation per instance, lock-free fast path for fresh
//!   entries, forced reload, cooperative cancellation, explicit disposal.
//! - [`CacheMetrics`] — per-instance hit/miss counters with a derived
//!   ratio, exposed to callers via [`MetricsSnapshot`].
//! - [`cached_response()`](response::cached_response) — merges a payload
//!   with cache metadata into the stable JSON shape machine callers see.

pub mod metrics;
pub mod response;
mod resource;

pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use resource::{CacheLookup, CachedEntry, DEFAULT_TTL, ResourceCache};
