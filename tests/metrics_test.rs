//! Tests for [`CacheMetrics`] exactness and the telemetry counters.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::thread;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use dotgate::cache::CacheMetrics;
use dotgate::locking::OperationLockManager;
use dotgate::redact::redact;
use dotgate::telemetry;

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

// ============================================================================
// CacheMetrics exactness
// ============================================================================

#[test]
fn concurrent_increments_are_exact() {
    const HIT_THREADS: usize = 8;
    const MISS_THREADS: usize = 4;
    const PER_THREAD: u64 = 1_000;

    let metrics = Arc::new(CacheMetrics::new());
    let mut handles = Vec::new();

    for _ in 0..HIT_THREADS {
        let metrics = Arc::clone(&metrics);
        handles.push(thread::spawn(move || {
            for _ in 0..PER_THREAD {
                metrics.record_hit();
            }
        }));
    }
    for _ in 0..MISS_THREADS {
        let metrics = Arc::clone(&metrics);
        handles.push(thread::spawn(move || {
            for _ in 0..PER_THREAD {
                metrics.record_miss();
            }
        }));
    }
    for h in handles {
        h.join().expect("thread panicked");
    }

    let hits = HIT_THREADS as u64 * PER_THREAD;
    let misses = MISS_THREADS as u64 * PER_THREAD;
    assert_eq!(metrics.hits(), hits);
    assert_eq!(metrics.misses(), misses);
    assert_eq!(metrics.hit_ratio(), hits as f64 / (hits + misses) as f64);
}

#[test]
fn ratio_is_zero_with_no_lookups() {
    let metrics = CacheMetrics::new();
    assert_eq!(metrics.hit_ratio(), 0.0);
}

#[test]
fn display_shows_whole_percentage() {
    let metrics = CacheMetrics::new();
    for _ in 0..3 {
        metrics.record_hit();
    }
    metrics.record_miss();
    assert_eq!(metrics.to_string(), "Hits: 3, Misses: 1, Hit Ratio: 75%");
}

#[test]
fn snapshot_is_a_stable_copy() {
    let metrics = CacheMetrics::new();
    metrics.record_hit();
    let snap = metrics.snapshot();
    metrics.record_miss();

    // The snapshot does not follow later mutations.
    assert_eq!(snap.hits, 1);
    assert_eq!(snap.misses, 0);
    assert_eq!(snap.hit_ratio, 1.0);
}

// ============================================================================
// Telemetry counters (process-wide, via the metrics facade)
// ============================================================================

#[test]
fn redaction_emits_counter() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let out = redact("password=hunter22 token=abc123def");
        assert!(!out.contains("hunter22"));
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::REDACTIONS_TOTAL), 2);
}

#[test]
fn conflict_emits_counter() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let locks = OperationLockManager::new();
        assert!(locks.try_acquire("build", "/p/a.csproj").is_acquired());
        assert!(!locks.try_acquire("restore", "/p/a.csproj").is_acquired());
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_total(&snapshot, telemetry::OPERATION_CONFLICTS_TOTAL),
        1
    );
}
