//! CliGateway — composition of the core subsystems.
//!
//! One gateway owns one [`OperationLockManager`], one
//! [`ResourceCache`] per read-mostly resource kind, and a
//! [`CommandRunner`]. Nothing here is global: whoever serves remote
//! callers constructs a gateway (usually via
//! [`Dotgate::builder()`](super::Dotgate::builder)) and owns its
//! lifecycle, which keeps every test able to build a fresh instance.
//!
//! Control flow for a mutating operation:
//!
//! ```text
//! invoke(kind, target, args)
//!   ├─ lock manager: try_acquire — conflict? → CONCURRENCY_CONFLICT result
//!   ├─ runner: spawn external tool (cancellable)
//!   └─ classifier: exit code + stderr → CommandResult (redacted)
//! ```
//!
//! Read-mostly queries (`list_sdks`, …) go through the single-flight
//! cache instead of the lock manager and return the cached-response JSON
//! shape (payload + `cache` metadata).

use std::sync::Arc;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::response::cached_response;
use crate::cache::ResourceCache;
use crate::classify::{self, CommandResult};
use crate::config::GatewayConfig;
use crate::exec::CommandRunner;
use crate::locking::OperationLockManager;
use crate::telemetry;
use crate::{DotgateError, Result};

/// Gateway over the external CLI: locks, caches, classification.
pub struct CliGateway {
    config: GatewayConfig,
    runner: Arc<dyn CommandRunner>,
    locks: OperationLockManager,
    sdk_list: ResourceCache<String>,
    runtime_list: ResourceCache<String>,
    template_list: ResourceCache<String>,
}

impl CliGateway {
    pub(crate) fn new(config: GatewayConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let ttl = config.cache.ttl();
        let template_ttl = config.cache.template_ttl();
        Self {
            locks: OperationLockManager::with_policy(config.lock_policy()),
            sdk_list: ResourceCache::with_ttl("sdk_list", ttl),
            runtime_list: ResourceCache::with_ttl("runtime_list", ttl),
            template_list: ResourceCache::with_ttl("template_list", template_ttl),
            config,
            runner,
        }
    }

    /// Run one operation against the external tool.
    ///
    /// The lock manager is consulted first (fast, synchronous): if a
    /// conflicting operation holds the target, a pre-built
    /// `CONCURRENCY_CONFLICT` result is returned without spawning
    /// anything. Otherwise the operation is registered for the duration
    /// of the call (released on every exit path), the tool runs, and the
    /// raw output is classified.
    ///
    /// Cancellation surfaces as an `OPERATION_CANCELLED` result.
    pub async fn invoke(
        &self,
        kind: &str,
        target: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<CommandResult> {
        let guard = match self.locks.try_acquire_guard(kind, target) {
            Ok(guard) => guard,
            Err(conflict) => {
                return Ok(classify::concurrency_conflict(kind, target, &conflict));
            }
        };

        let command_line = self.command_line(args);
        debug!(kind, target, command = %command_line, "invoking external tool");

        let result = match self.runner.run(&self.config.program, args, cancel).await {
            Ok(raw) => classify::classify(&raw.stdout, &raw.stderr, raw.exit_code, Some(&command_line)),
            Err(e) if e.is_cancellation() => classify::cancelled(Some(&command_line)),
            Err(e) => return Err(e),
        };

        let status = if result.success { "ok" } else { "error" };
        metrics::counter!(
            telemetry::OPERATIONS_TOTAL,
            "kind" => kind.to_owned(),
            "status" => status,
        )
        .increment(1);

        drop(guard);
        Ok(result)
    }

    /// Installed SDK list (`--list-sdks`), cached.
    pub async fn list_sdks(&self, force_reload: bool, cancel: &CancellationToken) -> Result<Value> {
        self.cached_query(&self.sdk_list, &["--list-sdks"], "sdks", force_reload, cancel)
            .await
    }

    /// Installed runtime list (`--list-runtimes`), cached.
    pub async fn list_runtimes(
        &self,
        force_reload: bool,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.cached_query(
            &self.runtime_list,
            &["--list-runtimes"],
            "runtimes",
            force_reload,
            cancel,
        )
        .await
    }

    /// Installed template list (`new list`), cached with the longer
    /// template TTL.
    pub async fn list_templates(
        &self,
        force_reload: bool,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.cached_query(
            &self.template_list,
            &["new", "list"],
            "templates",
            force_reload,
            cancel,
        )
        .await
    }

    /// Clear every query cache (entry + metrics). Administrative reset.
    pub async fn clear_caches(&self, cancel: &CancellationToken) -> Result<()> {
        self.sdk_list.clear(cancel).await?;
        self.runtime_list.clear(cancel).await?;
        self.template_list.clear(cancel).await?;
        Ok(())
    }

    /// The lock manager, for diagnostics (`active_operation_count`) and
    /// administrative `clear()`.
    pub fn locks(&self) -> &OperationLockManager {
        &self.locks
    }

    /// The SDK-list cache (metrics snapshots, disposal).
    pub fn sdk_list_cache(&self) -> &ResourceCache<String> {
        &self.sdk_list
    }

    /// The runtime-list cache.
    pub fn runtime_list_cache(&self) -> &ResourceCache<String> {
        &self.runtime_list
    }

    /// The template-list cache.
    pub fn template_list_cache(&self) -> &ResourceCache<String> {
        &self.template_list
    }

    /// Single-flight cached query: run the tool, classify, cache the
    /// redacted output on success, and wrap it in the cached-response
    /// JSON shape.
    ///
    /// Failed invocations are *not* published to the cache — they surface
    /// as [`DotgateError::QueryFailed`] carrying the classified result.
    async fn cached_query(
        &self,
        cache: &ResourceCache<String>,
        args: &[&str],
        payload_key: &str,
        force_reload: bool,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let command_line = self.command_line(&args);

        let loader = || {
            let args = args.clone();
            let command_line = command_line.clone();
            async move {
                let raw = self.runner.run(&self.config.program, &args, cancel).await?;
                let result = classify::classify(
                    &raw.stdout,
                    &raw.stderr,
                    raw.exit_code,
                    Some(&command_line),
                );
                if result.success {
                    Ok(result.output.unwrap_or_default())
                } else {
                    Err(DotgateError::QueryFailed(Box::new(result)))
                }
            }
        };
        let lookup = cache.get_or_load(loader, force_reload, cancel).await?;

        let lines: Vec<&str> = lookup
            .value
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let mut payload = serde_json::Map::new();
        payload.insert(payload_key.to_string(), json!(lines));
        let metrics = cache.metrics()?;
        Ok(cached_response(
            Value::Object(payload),
            &lookup,
            cache.ttl(),
            metrics,
        ))
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut line = self.config.program.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}
