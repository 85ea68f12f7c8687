//! Dotgate error types

/// Dotgate error types
#[derive(Debug, thiserror::Error)]
pub enum DotgateError {
    /// A cache instance was used after [`dispose()`](crate::cache::ResourceCache::dispose).
    ///
    /// Fatal to the call, never retried — the caller holds a dead handle.
    #[error("cache '{0}' has been disposed")]
    Disposed(String),

    /// The caller's cancellation token fired while waiting on a lock or
    /// while a loader/process was running.
    ///
    /// Distinct from a processing failure: callers decide whether to retry.
    #[error("operation cancelled")]
    Cancelled,

    /// The external tool binary could not be launched at all (not found,
    /// permission denied). Distinct from a non-zero exit, which is a
    /// *result*, not an error.
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    /// A cached query's underlying tool invocation failed. Carries the
    /// classified result so callers can surface it without re-running the
    /// command; failed results are never published to the cache.
    #[error("query failed: {}", .0.primary_code().unwrap_or("unknown"))]
    QueryFailed(Box<crate::classify::CommandResult>),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DotgateError {
    /// Whether this error is a cooperative cancellation rather than a
    /// failure. Cancellations are surfaced to callers unchanged; failures
    /// go through the classifier.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DotgateError::Cancelled)
    }
}

/// Result type alias for dotgate operations
pub type Result<T> = std::result::Result<T, DotgateError>;
