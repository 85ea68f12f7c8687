//! Configuration loading for the gateway.
//!
//! Product data lives here rather than in code: cache TTLs per resource
//! kind and the set of operation kinds that count as mutating. Loaded from
//! TOML; every field has a default, so an empty file (or no file) yields a
//! working configuration.
//!
//! ```toml
//! [cache]
//! ttl_secs = 300
//! template_ttl_secs = 900
//!
//! [locking]
//! extra_mutating_kinds = ["ef-migrations-add"]
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::locking::LockPolicy;
use crate::{DotgateError, Result};

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub locking: LockSettings,
    /// The external tool binary (default: `dotnet`).
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            locking: LockSettings::default(),
            program: default_program(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            DotgateError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|e| {
            DotgateError::Configuration(format!("cannot parse {}: {e}", path.display()))
        })
    }

    /// Build the [`LockPolicy`] this configuration describes: the default
    /// mutating set plus any extra kinds.
    pub fn lock_policy(&self) -> LockPolicy {
        let mut policy = LockPolicy::default();
        for kind in &self.locking.extra_mutating_kinds {
            policy.mark_mutating(kind.clone());
        }
        policy
    }
}

/// Cache TTLs.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Default TTL for cached query results in seconds (default: 300).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// TTL for the installed-template list in seconds (default: 900 —
    /// templates change only on explicit install/uninstall).
    #[serde(default = "default_template_ttl_secs")]
    pub template_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            template_ttl_secs: default_template_ttl_secs(),
        }
    }
}

impl CacheSettings {
    /// Default TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Template-list TTL as a [`Duration`].
    pub fn template_ttl(&self) -> Duration {
        Duration::from_secs(self.template_ttl_secs)
    }
}

/// Lock-manager configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockSettings {
    /// Operation kinds to treat as mutating in addition to the built-in
    /// set (see [`LockPolicy`]).
    #[serde(default)]
    pub extra_mutating_kinds: Vec<String>,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_template_ttl_secs() -> u64 {
    900
}

fn default_program() -> String {
    "dotnet".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_defaults() {
        let config: GatewayConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.cache.template_ttl_secs, 900);
        assert_eq!(config.program, "dotnet");
        assert!(config.lock_policy().is_mutating("build"));
    }

    #[test]
    fn extra_mutating_kinds_extend_policy() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [locking]
            extra_mutating_kinds = ["ef-migrations-add"]
            "#,
        )
        .expect("config parses");

        let policy = config.lock_policy();
        assert!(policy.is_mutating("ef-migrations-add"));
        assert!(policy.is_mutating("restore"));
    }
}
