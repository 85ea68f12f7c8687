//! Cached-response JSON helper.
//!
//! Machine callers that receive a cached query result also want to know
//! *how* cached it is — whether the lookup hit, how old the entry is, and
//! how the cache is performing overall. [`cached_response()`] merges a
//! payload with that metadata under a single `cache` key, using stable
//! field names:
//!
//! ```json
//! {
//!   "sdks": ["8.0.404", "9.0.101"],
//!   "cache": {
//!     "hit": true,
//!     "cacheAgeSeconds": 42,
//!     "cacheDurationSeconds": 300,
//!     "metrics": { "hits": 10, "misses": 2, "hitRatio": 0.83 },
//!     "timestamp": "2026-08-07T12:00:00Z"
//!   }
//! }
//! ```
//!
//! Non-object payloads are wrapped under a `data` key so the `cache` key
//! always has somewhere to live.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use super::metrics::MetricsSnapshot;
use super::resource::CacheLookup;

/// Merge `payload` with cache metadata from a lookup.
///
/// `ttl` is the cache's configured entry lifetime; `metrics` a snapshot of
/// its per-instance counters taken after the lookup.
pub fn cached_response<T>(
    payload: Value,
    lookup: &CacheLookup<T>,
    ttl: Duration,
    metrics: MetricsSnapshot,
) -> Value {
    let cache = json!({
        "hit": lookup.hit,
        "cacheAgeSeconds": lookup.age.as_secs(),
        "cacheDurationSeconds": ttl.as_secs(),
        "metrics": {
            "hits": metrics.hits,
            "misses": metrics.misses,
            "hitRatio": metrics.hit_ratio,
        },
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    });

    match payload {
        Value::Object(mut map) => {
            map.insert("cache".to_string(), cache);
            Value::Object(map)
        }
        other => json!({ "data": other, "cache": cache }),
    }
}
