//! Cross-operation concurrency control.
//!
//! [`OperationLockManager`] is a registry of in-flight mutating operations
//! keyed by their normalized target. Two mutating operations (build,
//! restore, publish, …) against the same project file corrupt each other's
//! intermediate state, so the second caller is rejected immediately — no
//! queueing, no blocking. Read-only operations never conflict with
//! anything and are not tracked.
//!
//! The registry is the one genuinely shared mutable structure in the
//! crate; every mutation goes through one `std::sync::Mutex`, held only
//! for map lookups (acquisition is synchronous and never suspends).
//!
//! Which operation kinds count as mutating is configuration, not code:
//! see [`LockPolicy`]. Within the mutating class, *any* two kinds conflict
//! on the same target — a `build` blocks a `restore` just as it blocks
//! another `build`.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use tracing::{debug, warn};

use crate::telemetry;

/// Operation kinds treated as mutating, i.e. mutually exclusive per target.
///
/// Shipped as data so integrators can extend the set without touching the
/// conflict mechanism. The default set covers the .NET CLI subcommands
/// that write to a project, its package graph, or shared tool state.
#[derive(Debug, Clone)]
pub struct LockPolicy {
    mutating: HashSet<String>,
}

/// Subcommands that mutate a project or shared tool state.
const DEFAULT_MUTATING_KINDS: &[&str] = &[
    "build",
    "restore",
    "publish",
    "pack",
    "test",
    "run",
    "clean",
    "package-add",
    "package-remove",
    "reference-add",
    "reference-remove",
    "format",
    "template-install",
    "template-uninstall",
    "template-cache-clear",
    "workload-install",
    "workload-update",
    "sdk-install",
];

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            mutating: DEFAULT_MUTATING_KINDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl LockPolicy {
    /// The default mutating-kind set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from an explicit set of mutating kinds.
    pub fn with_mutating_kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mutating: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a mutating kind to the set.
    pub fn mark_mutating(&mut self, kind: impl Into<String>) {
        self.mutating.insert(kind.into());
    }

    /// Whether `kind` belongs to the mutating class.
    pub fn is_mutating(&self, kind: &str) -> bool {
        self.mutating.contains(kind)
    }
}

/// Descriptor for one registered in-flight operation.
#[derive(Debug, Clone)]
struct ActiveOperation {
    kind: String,
    target: String,
    started_at: Instant,
}

/// Outcome of a [`try_acquire`](OperationLockManager::try_acquire) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquire {
    /// The operation was registered; the caller must
    /// [`release`](OperationLockManager::release) it (or hold an
    /// [`OperationGuard`]).
    Acquired,
    /// A conflicting operation holds the target. The description names the
    /// conflicting operation's kind and normalized target, ready for a
    /// user-facing error.
    Conflict(String),
}

impl Acquire {
    /// `true` for [`Acquire::Acquired`].
    pub fn is_acquired(&self) -> bool {
        matches!(self, Acquire::Acquired)
    }

    /// The conflict description, if any.
    pub fn conflict(&self) -> Option<&str> {
        match self {
            Acquire::Acquired => None,
            Acquire::Conflict(desc) => Some(desc),
        }
    }
}

/// Registry of in-flight mutating operations, safe for concurrent use.
///
/// One instance per gateway (constructor-injected, not global). Racing
/// `try_acquire` calls for the same target get an atomic answer: exactly
/// one of them registers, the rest see the conflict.
#[derive(Debug, Default)]
pub struct OperationLockManager {
    policy: LockPolicy,
    active: Mutex<HashMap<String, ActiveOperation>>,
}

impl OperationLockManager {
    /// Create a manager with the default [`LockPolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with a custom policy.
    pub fn with_policy(policy: LockPolicy) -> Self {
        Self {
            policy,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Try to register `(kind, target)` as in flight.
    ///
    /// Read-only kinds always succeed without registering. For mutating
    /// kinds the target is normalized (absolute path, case-folded; empty
    /// stays the global sentinel) and checked against the registry: if any
    /// mutating operation already holds the same normalized target the
    /// call returns [`Acquire::Conflict`] without mutating the registry.
    pub fn try_acquire(&self, kind: &str, target: &str) -> Acquire {
        if !self.policy.is_mutating(kind) {
            return Acquire::Acquired;
        }

        let normalized = normalize_target(target);
        let mut active = self.lock_active();

        if let Some(existing) = active.get(&normalized) {
            let description = format!(
                "operation '{}' is already running against '{}'",
                existing.kind, existing.target
            );
            warn!(
                kind,
                target = %normalized,
                conflicting_kind = %existing.kind,
                "operation rejected: target busy"
            );
            metrics::counter!(telemetry::OPERATION_CONFLICTS_TOTAL, "kind" => kind.to_owned())
                .increment(1);
            return Acquire::Conflict(description);
        }

        active.insert(
            normalized.clone(),
            ActiveOperation {
                kind: kind.to_string(),
                target: normalized.clone(),
                started_at: Instant::now(),
            },
        );
        debug!(kind, target = %normalized, "operation registered");
        Acquire::Acquired
    }

    /// Acquire and wrap the registration in an RAII guard that releases on
    /// drop, so the registry is cleaned up on every exit path.
    pub fn try_acquire_guard<'a>(
        &'a self,
        kind: &str,
        target: &str,
    ) -> std::result::Result<OperationGuard<'a>, String> {
        match self.try_acquire(kind, target) {
            Acquire::Acquired => Ok(OperationGuard {
                manager: self,
                kind: kind.to_string(),
                target: target.to_string(),
            }),
            Acquire::Conflict(desc) => Err(desc),
        }
    }

    /// Remove the registration for `(kind, target)`.
    ///
    /// Releasing an entry that does not exist (or was registered by a
    /// different kind) is a silent no-op — release is idempotent.
    pub fn release(&self, kind: &str, target: &str) {
        if !self.policy.is_mutating(kind) {
            return;
        }
        let normalized = normalize_target(target);
        let mut active = self.lock_active();
        if let Some(existing) = active.get(&normalized) {
            if existing.kind == kind {
                active.remove(&normalized);
                debug!(kind, target = %normalized, "operation released");
            }
        }
    }

    /// Number of currently registered operations (diagnostic).
    pub fn active_operation_count(&self) -> usize {
        self.lock_active().len()
    }

    /// How long the operation holding `target` has been running, if any.
    pub fn held_for(&self, target: &str) -> Option<std::time::Duration> {
        let normalized = normalize_target(target);
        self.lock_active()
            .get(&normalized)
            .map(|op| op.started_at.elapsed())
    }

    /// Forcibly empty the registry (test isolation, administrative reset).
    pub fn clear(&self) {
        self.lock_active().clear();
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, HashMap<String, ActiveOperation>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// RAII registration: releases the underlying entry when dropped.
#[derive(Debug)]
pub struct OperationGuard<'a> {
    manager: &'a OperationLockManager,
    kind: String,
    target: String,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.manager.release(&self.kind, &self.target);
    }
}

/// Normalize an operation target for conflict comparison.
///
/// Absolute, case-folded path form; the empty string is preserved as the
/// sentinel for global, target-less operations (e.g. clearing the template
/// cache).
pub fn normalize_target(target: &str) -> String {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let absolute = std::path::absolute(trimmed)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| trimmed.to_string());
    absolute.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_target_is_global_sentinel() {
        assert_eq!(normalize_target(""), "");
        assert_eq!(normalize_target("   "), "");
    }

    #[test]
    fn normalization_case_folds() {
        assert_eq!(
            normalize_target("/PATH/X.CSPROJ"),
            normalize_target("/path/x.csproj")
        );
    }

    #[test]
    fn relative_targets_become_absolute() {
        let normalized = normalize_target("app.csproj");
        assert!(std::path::Path::new(&normalized).is_absolute());
    }

    #[test]
    fn guard_releases_on_drop() {
        let locks = OperationLockManager::new();
        {
            let _guard = locks.try_acquire_guard("build", "/p/a.csproj").unwrap();
            assert_eq!(locks.active_operation_count(), 1);
        }
        assert_eq!(locks.active_operation_count(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let locks = OperationLockManager::new();
        locks.release("build", "/p/never-acquired.csproj");
        assert_eq!(locks.active_operation_count(), 0);
    }

    #[test]
    fn release_by_other_kind_is_noop() {
        let locks = OperationLockManager::new();
        assert!(locks.try_acquire("build", "/p/a.csproj").is_acquired());
        locks.release("restore", "/p/a.csproj");
        assert_eq!(locks.active_operation_count(), 1);
    }
}
