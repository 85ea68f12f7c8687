//! Telemetry metric name constants.
//!
//! Centralised metric names for dotgate operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `dotgate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `resource` — cached resource kind (e.g. "sdk_list", "template_list")
//! - `kind` — operation kind (e.g. "build", "restore")
//! - `status` — outcome: "ok" or "error"

/// Total cache hits, across every [`ResourceCache`](crate::cache::ResourceCache).
///
/// Labels: `resource`.
pub const CACHE_HITS_TOTAL: &str = "dotgate_cache_hits_total";

/// Total cache misses (each miss corresponds to one loader invocation).
///
/// Labels: `resource`.
pub const CACHE_MISSES_TOTAL: &str = "dotgate_cache_misses_total";

/// Total operations dispatched through the gateway.
///
/// Labels: `kind`, `status` ("ok" | "error").
pub const OPERATIONS_TOTAL: &str = "dotgate_operations_total";

/// Total operations rejected because a conflicting operation held the
/// same target.
///
/// Labels: `kind`.
pub const OPERATION_CONFLICTS_TOTAL: &str = "dotgate_operation_conflicts_total";

/// External command duration in seconds.
///
/// Labels: `program`.
pub const COMMAND_DURATION_SECONDS: &str = "dotgate_command_duration_seconds";

/// Total secret values masked by the redactor.
pub const REDACTIONS_TOTAL: &str = "dotgate_redactions_total";
