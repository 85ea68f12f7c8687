//! Dotgate - Structured gateway for .NET CLI tooling
//!
//! This crate wraps an external package/SDK manager CLI for machine
//! callers: read-mostly queries are cached with single-flight stampede
//! protection, conflicting mutating operations on the same project are
//! rejected up front, and every raw process result is translated into a
//! typed, redacted, machine-readable [`CommandResult`] with stable error
//! codes.
//!
//! The transport that exposes operations to remote callers (MCP,
//! JSON-RPC, …) sits above this crate and is out of scope here, as is the
//! grammar of the wrapped tool's subcommands.
//!
//! # Example
//!
//! ```rust,no_run
//! use dotgate::Dotgate;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> dotgate::Result<()> {
//!     let gateway = Dotgate::builder().build();
//!     let cancel = CancellationToken::new();
//!
//!     // Cached, single-flight query.
//!     let sdks = gateway.list_sdks(false, &cancel).await?;
//!     println!("{sdks}");
//!
//!     // Mutating operation: conflict-checked, classified, redacted.
//!     let result = gateway
//!         .invoke("build", "/p/app.csproj", &["build".into(), "/p/app.csproj".into()], &cancel)
//!         .await?;
//!     println!("{}", dotgate::classify::to_json(&result)?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod exec;
pub mod gateway;
pub mod locking;
pub mod redact;
pub mod telemetry;

// Re-export main types at crate root
pub use error::{DotgateError, Result};
pub use gateway::{CliGateway, Dotgate, DotgateBuilder};

pub use cache::{CacheLookup, CacheMetrics, CachedEntry, MetricsSnapshot, ResourceCache};
pub use classify::{CommandResult, ErrorCategory, ErrorData, McpErrorCode, ToolError};
pub use config::{CacheSettings, GatewayConfig, LockSettings};
pub use exec::{CommandRunner, ProcessRunner, RawOutput};
pub use locking::{Acquire, LockPolicy, OperationGuard, OperationLockManager};
pub use redact::{REDACTION_MARKER, redact};
