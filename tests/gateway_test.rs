//! Tests for [`CliGateway`] — lock → run → classify composition.
//!
//! All tests substitute a mock [`CommandRunner`]; nothing here spawns a
//! real process.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use dotgate::exec::{CommandRunner, RawOutput};
use dotgate::{Dotgate, DotgateError, Result};

// ============================================================================
// Mock runner
// ============================================================================

struct MockRunner {
    /// Responses handed out in order; the last one repeats.
    responses: Mutex<VecDeque<RawOutput>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockRunner {
    fn returning(responses: Vec<RawOutput>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            delay: None,
        })
    }

    fn slow(response: RawOutput, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(vec![response].into()),
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn ok(stdout: &str) -> RawOutput {
    RawOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn failed(exit_code: i32, stderr: &str) -> RawOutput {
    RawOutput {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        _program: &str,
        _args: &[String],
        cancel: &CancellationToken,
    ) -> Result<RawOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(DotgateError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        let mut responses = self.responses.lock().expect("mock lock");
        let response = if responses.len() > 1 {
            responses.pop_front().expect("non-empty")
        } else {
            responses.front().cloned().unwrap_or_default()
        };
        Ok(response)
    }
}

fn token() -> CancellationToken {
    CancellationToken::new()
}

// ============================================================================
// Cached queries
// ============================================================================

#[tokio::test]
async fn list_sdks_is_cached_across_calls() {
    let runner = MockRunner::returning(vec![ok(
        "8.0.404 [/usr/share/dotnet/sdk]\n9.0.101 [/usr/share/dotnet/sdk]\n",
    )]);
    let gateway = Dotgate::builder().runner(runner.clone()).build();
    let cancel = token();

    let first = gateway.list_sdks(false, &cancel).await.expect("query ok");
    assert_eq!(first["cache"]["hit"], false);
    assert_eq!(first["sdks"].as_array().expect("array").len(), 2);
    assert_eq!(runner.calls(), 1);

    let second = gateway.list_sdks(false, &cancel).await.expect("query ok");
    assert_eq!(second["cache"]["hit"], true);
    assert_eq!(second["cache"]["metrics"]["hits"], 1);
    assert_eq!(second["cache"]["metrics"]["misses"], 1);
    assert_eq!(runner.calls(), 1, "second lookup must not re-run the tool");
}

#[tokio::test]
async fn force_reload_reruns_the_tool() {
    let runner = MockRunner::returning(vec![
        ok("8.0.404 [/usr/share/dotnet/sdk]\n"),
        ok("8.0.404 [/usr/share/dotnet/sdk]\n9.0.101 [/usr/share/dotnet/sdk]\n"),
    ]);
    let gateway = Dotgate::builder().runner(runner.clone()).build();
    let cancel = token();

    gateway.list_sdks(false, &cancel).await.expect("seed");
    let reloaded = gateway.list_sdks(true, &cancel).await.expect("reload");

    assert_eq!(reloaded["cache"]["hit"], false);
    assert_eq!(reloaded["sdks"].as_array().expect("array").len(), 2);
    assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn failed_query_is_not_cached() {
    let runner = MockRunner::returning(vec![
        failed(1, "/src/app.csproj : error NU1101: Unable to find package X"),
        ok("9.0.101 [/usr/share/dotnet/sdk]\n"),
    ]);
    let gateway = Dotgate::builder().runner(runner.clone()).build();
    let cancel = token();

    let err = gateway.list_sdks(false, &cancel).await.unwrap_err();
    match err {
        DotgateError::QueryFailed(result) => {
            assert_eq!(result.primary_code(), Some("NU1101"));
        }
        other => panic!("expected QueryFailed, got {other}"),
    }

    // The failure was not published: the next call runs the tool again.
    let second = gateway.list_sdks(false, &cancel).await.expect("recovers");
    assert_eq!(second["cache"]["hit"], false);
    assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn caches_are_independent_per_resource() {
    let runner = MockRunner::returning(vec![ok("line\n")]);
    let gateway = Dotgate::builder().runner(runner.clone()).build();
    let cancel = token();

    gateway.list_sdks(false, &cancel).await.expect("sdks");
    let runtimes = gateway.list_runtimes(false, &cancel).await.expect("runtimes");

    // Each resource kind has its own cache: the runtime query is a miss
    // even though the SDK cache is warm.
    assert_eq!(runtimes["cache"]["hit"], false);
    assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn clear_caches_forces_reload_and_zeroes_metrics() {
    let runner = MockRunner::returning(vec![ok("line\n")]);
    let gateway = Dotgate::builder().runner(runner.clone()).build();
    let cancel = token();

    gateway.list_sdks(false, &cancel).await.expect("seed");
    gateway.list_sdks(false, &cancel).await.expect("hit");
    gateway.clear_caches(&cancel).await.expect("clear");

    let metrics = gateway.sdk_list_cache().metrics().expect("live cache");
    assert_eq!(metrics.hits, 0);
    assert_eq!(metrics.misses, 0);

    let after = gateway.list_sdks(false, &cancel).await.expect("reload");
    assert_eq!(after["cache"]["hit"], false);
    assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn cached_response_carries_metadata_shape() {
    let runner = MockRunner::returning(vec![ok("line\n")]);
    let gateway = Dotgate::builder()
        .runner(runner)
        .cache_ttl_secs(120)
        .build();

    let response = gateway.list_sdks(false, &token()).await.expect("query ok");
    let cache = &response["cache"];
    assert_eq!(cache["cacheDurationSeconds"], 120);
    assert_eq!(cache["cacheAgeSeconds"], 0);
    assert!(cache["metrics"]["hitRatio"].is_number());
    assert!(cache["timestamp"].is_string());
}

// ============================================================================
// Mutating operations
// ============================================================================

#[tokio::test]
async fn invoke_classifies_success() {
    let runner = MockRunner::returning(vec![ok("Build succeeded.\n")]);
    let gateway = Dotgate::builder().runner(runner).build();

    let result = gateway
        .invoke(
            "build",
            "/p/app.csproj",
            &["build".into(), "/p/app.csproj".into()],
            &token(),
        )
        .await
        .expect("invoke ok");

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("Build succeeded.\n"));
    assert_eq!(
        result.command.as_deref(),
        Some("dotnet build /p/app.csproj")
    );
}

#[tokio::test]
async fn invoke_conflict_returns_prebuilt_result() {
    let runner = MockRunner::returning(vec![ok("")]);
    let gateway = Dotgate::builder().runner(runner.clone()).build();

    // A restore is already holding the target.
    assert!(
        gateway
            .locks()
            .try_acquire("restore", "/p/app.csproj")
            .is_acquired()
    );

    let result = gateway
        .invoke(
            "build",
            "/p/app.csproj",
            &["build".into(), "/p/app.csproj".into()],
            &token(),
        )
        .await
        .expect("invoke returns a result, not an error");

    assert!(!result.success);
    assert_eq!(result.exit_code, -1);
    assert_eq!(result.primary_code(), Some("CONCURRENCY_CONFLICT"));
    let data = result.errors[0].data.as_ref().expect("data payload");
    assert!(
        data.additional_data["conflictingOperation"]
            .as_str()
            .expect("string")
            .contains("restore")
    );
    assert_eq!(runner.calls(), 0, "conflicting operation must not spawn");
}

#[tokio::test]
async fn invoke_releases_the_target_on_completion() {
    let runner = MockRunner::returning(vec![ok("done\n")]);
    let gateway = Dotgate::builder().runner(runner).build();
    let cancel = token();
    let args = vec!["build".to_string(), "/p/app.csproj".to_string()];

    gateway
        .invoke("build", "/p/app.csproj", &args, &cancel)
        .await
        .expect("first invoke");
    assert_eq!(gateway.locks().active_operation_count(), 0);

    // The same target can be operated on again.
    let result = gateway
        .invoke("restore", "/p/app.csproj", &args, &cancel)
        .await
        .expect("second invoke");
    assert!(result.success);
}

#[tokio::test]
async fn invoke_failure_is_classified_and_released() {
    let runner = MockRunner::returning(vec![failed(
        1,
        "Program.cs(10,5): error CS0103: The name 'foo' does not exist in the current context",
    )]);
    let gateway = Dotgate::builder().runner(runner).build();

    let result = gateway
        .invoke(
            "build",
            "/p/app.csproj",
            &["build".into(), "/p/app.csproj".into()],
            &token(),
        )
        .await
        .expect("invoke ok");

    assert!(!result.success);
    assert_eq!(result.primary_code(), Some("CS0103"));
    assert_eq!(gateway.locks().active_operation_count(), 0);
}

#[tokio::test]
async fn invoke_cancellation_surfaces_dedicated_code() {
    let runner = MockRunner::slow(ok("never delivered"), Duration::from_secs(5));
    let gateway = Dotgate::builder().runner(runner).build();
    let cancel = token();

    let gateway = Arc::new(gateway);
    let call = {
        let gateway = Arc::clone(&gateway);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            gateway
                .invoke(
                    "build",
                    "/p/app.csproj",
                    &["build".into(), "/p/app.csproj".into()],
                    &cancel,
                )
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = call
        .await
        .expect("task ok")
        .expect("cancellation is a result, not an error");
    assert!(!result.success);
    assert_eq!(result.primary_code(), Some("OPERATION_CANCELLED"));

    // The guard was released on the cancellation path.
    assert_eq!(gateway.locks().active_operation_count(), 0);
}

#[tokio::test]
async fn read_only_kind_skips_conflict_check() {
    let runner = MockRunner::returning(vec![ok("Contoso.Widgets 1.2.3\n")]);
    let gateway = Dotgate::builder().runner(runner).build();

    assert!(
        gateway
            .locks()
            .try_acquire("build", "/p/app.csproj")
            .is_acquired()
    );

    // A read-only listing against the busy target proceeds.
    let result = gateway
        .invoke(
            "package-list",
            "/p/app.csproj",
            &["list".into(), "/p/app.csproj".into(), "package".into()],
            &token(),
        )
        .await
        .expect("invoke ok");
    assert!(result.success);
}
