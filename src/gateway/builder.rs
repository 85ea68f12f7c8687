//! Builder for configuring gateway instances

use std::sync::Arc;

use super::CliGateway;
use crate::config::GatewayConfig;
use crate::exec::{CommandRunner, ProcessRunner};

/// Main entry point for creating gateway instances.
pub struct Dotgate;

impl Dotgate {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> DotgateBuilder {
        DotgateBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// Every knob has a default: `build()` with no configuration yields a
/// gateway that shells out to `dotnet` with 300 s cache TTLs and the
/// built-in lock policy.
pub struct DotgateBuilder {
    config: GatewayConfig,
    runner: Option<Arc<dyn CommandRunner>>,
}

impl DotgateBuilder {
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            runner: None,
        }
    }

    /// Replace the whole configuration (e.g. one loaded from TOML).
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the external tool binary (default: `dotnet`).
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.config.program = program.into();
        self
    }

    /// Override the default cache TTL in seconds.
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.cache.ttl_secs = secs;
        self
    }

    /// Substitute a [`CommandRunner`] implementation.
    ///
    /// Tests inject mocks here; production code normally leaves the
    /// default [`ProcessRunner`] in place.
    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> CliGateway {
        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(ProcessRunner::new()));
        CliGateway::new(self.config, runner)
    }
}

impl Default for DotgateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
