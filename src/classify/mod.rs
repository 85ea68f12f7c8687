//! Error classification for raw process output.
//!
//! [`classify()`] is the terminal step of every operation: it turns an
//! exit code plus captured stdout/stderr into a [`CommandResult`] that is
//! typed, redacted, and machine-readable. It never fails and never
//! escalates — unrecognised output becomes a generic `EXIT_<n>` entry,
//! not an error in the classifier itself.
//!
//! Three diagnostic formats are recognised in stderr:
//!
//! ```text
//! Program.cs(10,5): error CS0103: The name 'foo' does not exist …
//! /src/app.csproj : error NU1101: Unable to find package …
//! MSBUILD : error MSB1009: Project file does not exist.
//! ```
//!
//! Matched codes are looked up in the static [`catalog`] (exact match,
//! case-insensitive — `NU1101X` is *not* `NU1101`) for category, hint,
//! explanation, documentation, and suggested fixes. A secondary mapping
//! assigns RPC-style [`McpErrorCode`]s: missing packages/projects/assets
//! are "resource not found", malformed source and unsupported frameworks
//! are "invalid params", and cancellation, concurrency conflicts, and
//! unclassified failures are "internal error".
//!
//! Every text field in the output passes through
//! [`redact()`](crate::redact::redact) before it is returned.

pub mod catalog;
mod result;

pub use result::{CommandResult, ErrorCategory, ErrorData, McpErrorCode, ToolError};

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::trace;

use crate::Result;
use crate::redact::redact;

/// Character budget for the stderr excerpt embedded in [`ErrorData`].
pub const STDERR_EXCERPT_CHARS: usize = 1000;

/// Marker appended when the stderr excerpt was cut at the budget.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Exit-code sentinel for operations that never ran (conflicts,
/// cancellations).
pub const EXIT_CODE_NOT_RUN: i32 = -1;

/// `file(line,col): error CODE: message` — compiler diagnostics.
static COMPILER_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<file>[^\s(][^(]*)\((?P<line>\d+),(?P<col>\d+)\)\s*:\s*(?:fatal\s+)?error\s+(?P<code>[A-Za-z]{1,9}\d{1,5}[A-Za-z0-9]*)\s*:\s*(?P<msg>.*\S)\s*$",
    )
    .expect("compiler diagnostic regex is valid")
});

/// `… error CODE: message` — build-engine, package-manager, and SDK
/// diagnostics, optionally prefixed with a source path.
static TOOL_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\berror\s+(?P<code>[A-Za-z]{1,9}\d{1,5}[A-Za-z0-9]*)\s*:\s*(?P<msg>.*\S)\s*$")
        .expect("tool diagnostic regex is valid")
});

/// One raw `(code, message)` pair extracted from stderr.
struct Diagnostic {
    code: String,
    message: String,
}

/// Classify raw process output into a [`CommandResult`].
///
/// - `exit_code == 0` → success carrying redacted stdout.
/// - `exit_code != 0` → one entry per distinct structured diagnostic found
///   in stderr, or a single generic `EXIT_<n>` entry when none matched.
///
/// `command` is the executed command line, included (redacted) in the
/// result and its [`ErrorData`] payloads when supplied.
pub fn classify(stdout: &str, stderr: &str, exit_code: i32, command: Option<&str>) -> CommandResult {
    let command = command.map(|c| redact(c).into_owned());

    if exit_code == 0 {
        return CommandResult {
            success: true,
            exit_code: 0,
            output: Some(redact(stdout).into_owned()),
            errors: Vec::new(),
            command,
        };
    }

    let mut diagnostics = extract_diagnostics(stderr);
    if diagnostics.is_empty() {
        diagnostics.push(Diagnostic {
            code: format!("EXIT_{exit_code}"),
            message: stderr
                .lines()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| format!("command exited with code {exit_code}")),
        });
    }
    trace!(exit_code, entries = diagnostics.len(), "classified process failure");

    let data = build_error_data(command.as_deref(), exit_code, stderr, Map::new());
    let errors = diagnostics
        .into_iter()
        .map(|d| build_error(d, Some(data.clone())))
        .collect();

    CommandResult {
        success: false,
        exit_code,
        output: None,
        errors,
        command,
    }
}

/// Pre-built result for an operation rejected by the
/// [`OperationLockManager`](crate::locking::OperationLockManager).
///
/// Carries the fixed code `CONCURRENCY_CONFLICT`, category
/// [`ErrorCategory::Concurrency`], the internal-error MCP mapping, the
/// [`EXIT_CODE_NOT_RUN`] sentinel, and the three inputs under
/// `additionalData`.
pub fn concurrency_conflict(kind: &str, target: &str, conflicting: &str) -> CommandResult {
    let mut additional = Map::new();
    additional.insert("operationKind".to_string(), json!(kind));
    additional.insert("target".to_string(), json!(target));
    additional.insert("conflictingOperation".to_string(), json!(conflicting));

    let data = build_error_data(None, EXIT_CODE_NOT_RUN, "", additional);
    let error = build_error(
        Diagnostic {
            code: "CONCURRENCY_CONFLICT".to_string(),
            message: conflicting.to_string(),
        },
        Some(data),
    );

    CommandResult {
        success: false,
        exit_code: EXIT_CODE_NOT_RUN,
        output: None,
        errors: vec![error],
        command: None,
    }
}

/// Pre-built result for a cooperatively cancelled operation.
///
/// Cancellation is surfaced distinctly from processing failures: a
/// dedicated code, category [`ErrorCategory::Cancelled`], and the
/// internal-error MCP mapping.
pub fn cancelled(command: Option<&str>) -> CommandResult {
    let command = command.map(|c| redact(c).into_owned());
    let data = build_error_data(command.as_deref(), EXIT_CODE_NOT_RUN, "", Map::new());
    let error = build_error(
        Diagnostic {
            code: "OPERATION_CANCELLED".to_string(),
            message: "the operation was cancelled before completion".to_string(),
        },
        Some(data),
    );

    CommandResult {
        success: false,
        exit_code: EXIT_CODE_NOT_RUN,
        output: None,
        errors: vec![error],
        command,
    }
}

/// Serialize a result to its stable external JSON form.
pub fn to_json(result: &CommandResult) -> Result<String> {
    Ok(serde_json::to_string(result)?)
}

/// Parse the external JSON form back into a [`CommandResult`].
pub fn from_json(json: &str) -> Result<CommandResult> {
    Ok(serde_json::from_str(json)?)
}

/// Extract structured diagnostics from stderr, deduplicated by
/// `(code, message)` in first-seen order (restore repeats the same NU
/// error once per target framework).
fn extract_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for line in stderr.lines() {
        let caps = COMPILER_DIAGNOSTIC
            .captures(line)
            .or_else(|| TOOL_DIAGNOSTIC.captures(line));
        let Some(caps) = caps else { continue };

        let code = caps["code"].to_ascii_uppercase();
        let message = caps["msg"].trim().to_string();
        if seen.insert((code.clone(), message.clone())) {
            out.push(Diagnostic { code, message });
        }
    }
    out
}

/// Assemble one [`ToolError`], consulting the catalogue and the MCP
/// mapping.
fn build_error(diagnostic: Diagnostic, data: Option<ErrorData>) -> ToolError {
    let message = redact(&diagnostic.message).into_owned();

    match catalog::lookup(&diagnostic.code) {
        Some(info) => ToolError {
            mcp_error_code: mcp_code_for(&diagnostic.code, info.category),
            code: diagnostic.code,
            message,
            category: info.category,
            hint: info.hint.to_string(),
            explanation: info.explanation.map(str::to_string),
            documentation_url: info.documentation_url.map(str::to_string),
            suggested_fixes: info.suggested_fixes.iter().map(|s| s.to_string()).collect(),
            data,
        },
        None => ToolError {
            mcp_error_code: mcp_code_for(&diagnostic.code, ErrorCategory::Unknown),
            code: diagnostic.code,
            message,
            category: ErrorCategory::Unknown,
            hint: "The tool reported an unrecognised error — inspect the stderr excerpt for details."
                .to_string(),
            explanation: None,
            documentation_url: None,
            suggested_fixes: Vec::new(),
            data,
        },
    }
}

/// Secondary mapping from (code, category) to an RPC-style error code.
///
/// Exact codes first, category class second; codes in neither bucket get
/// no MCP mapping at all.
fn mcp_code_for(code: &str, category: ErrorCategory) -> Option<McpErrorCode> {
    match code.to_ascii_uppercase().as_str() {
        // Missing packages, projects, and assets.
        "NU1101" | "NU1102" | "NU1103" | "MSB1003" | "MSB1009" | "NETSDK1004" => {
            Some(McpErrorCode::ResourceNotFound)
        }
        // Unsupported target framework / incompatible references.
        "NETSDK1045" | "NETSDK1013" | "MSB3644" | "NU1201" => Some(McpErrorCode::InvalidParams),
        _ => match category {
            // Malformed source.
            ErrorCategory::Compilation => Some(McpErrorCode::InvalidParams),
            ErrorCategory::Concurrency | ErrorCategory::Cancelled | ErrorCategory::Unknown => {
                Some(McpErrorCode::InternalError)
            }
            _ => None,
        },
    }
}

/// Build the structured `Data` payload: redacted command, exit code, and
/// a truncated, redacted stderr excerpt.
fn build_error_data(
    command: Option<&str>,
    exit_code: i32,
    stderr: &str,
    additional_data: Map<String, Value>,
) -> ErrorData {
    let stderr = if stderr.trim().is_empty() {
        None
    } else {
        Some(truncate_excerpt(&redact(stderr)))
    };
    ErrorData {
        command: command.map(str::to_string),
        exit_code,
        stderr,
        additional_data,
    }
}

/// Cut `text` at [`STDERR_EXCERPT_CHARS`] characters, appending the
/// truncation marker when anything was dropped.
fn truncate_excerpt(text: &str) -> String {
    let mut iter = text.char_indices();
    match iter.nth(STDERR_EXCERPT_CHARS) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
    }
}
