//! Process execution boundary.
//!
//! The rest of the crate treats "run the external tool" as an opaque async
//! operation returning exit code plus captured output. [`CommandRunner`]
//! is that seam: the gateway talks to the trait, production code uses
//! [`ProcessRunner`] over `tokio::process`, and tests substitute mocks —
//! no test in this repo ever spawns the real tool.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::telemetry;
use crate::{DotgateError, Result};

/// Raw outcome of one external command invocation.
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Async "run external command" capability.
///
/// Implementations must be cancellation-aware: when `cancel` fires the
/// call returns [`DotgateError::Cancelled`] and the child process (if any)
/// is reaped, not leaked.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, capturing exit code, stdout, and stderr.
    async fn run(&self, program: &str, args: &[String], cancel: &CancellationToken)
    -> Result<RawOutput>;
}

/// Production [`CommandRunner`] over `tokio::process`.
///
/// Stdout/stderr are piped and captured whole; stdin is closed. Child
/// processes are spawned with `kill_on_drop`, so a cancelled (or panicked)
/// caller does not leave the tool running.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<RawOutput> {
        let started = Instant::now();
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DotgateError::Launch {
                command: program.to_string(),
                source,
            })?;

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                // kill_on_drop reaps the child when the future is dropped.
                return Err(DotgateError::Cancelled);
            }
            output = child.wait_with_output() => output?,
        };

        let elapsed = started.elapsed();
        metrics::histogram!(telemetry::COMMAND_DURATION_SECONDS, "program" => program.to_owned())
            .record(elapsed.as_secs_f64());
        debug!(
            program,
            exit_code = output.status.code().unwrap_or(-1),
            elapsed_ms = elapsed.as_millis() as u64,
            "external command finished"
        );

        Ok(RawOutput {
            // Terminated-by-signal has no code; treat it as a generic failure.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
