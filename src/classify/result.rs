//! Structured result types for classified process output.
//!
//! The JSON projection of these types is the crate's external contract:
//! field names (`success`, `exitCode`, `output`, `errors`, `mcpErrorCode`,
//! `data.command`, `data.stderr`, `data.additionalData`, …) are stable and
//! round-trip through serde without losing content. Machine callers always
//! receive either a success with `output`/`exitCode` or a non-empty
//! `errors` array — never a mix, never an empty failure.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Broad classification of an error entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Compiler diagnostics (`CSnnnn`).
    Compilation,
    /// Package/restore diagnostics (`NUnnnn`).
    Package,
    /// Build-engine diagnostics (`MSBnnnn`).
    Build,
    /// SDK/toolchain diagnostics (`NETSDKnnnn`).
    Sdk,
    /// Rejected because a conflicting operation held the target.
    Concurrency,
    /// The caller cancelled the operation.
    Cancelled,
    /// Unrecognised failure.
    Unknown,
}

/// RPC-style error codes surfaced to protocol-level callers.
///
/// A small fixed enumeration; the numeric values follow the JSON-RPC /
/// MCP conventions and serialize as bare integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpErrorCode {
    /// A referenced package, project, or asset does not exist.
    ResourceNotFound,
    /// Malformed source or unsupported parameters (e.g. target framework).
    InvalidParams,
    /// Cancellation, concurrency conflicts, and unclassified failures.
    InternalError,
}

impl McpErrorCode {
    /// The wire value.
    pub fn code(self) -> i32 {
        match self {
            McpErrorCode::ResourceNotFound => -32002,
            McpErrorCode::InvalidParams => -32602,
            McpErrorCode::InternalError => -32603,
        }
    }

    /// Parse a wire value back into the enumeration.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -32002 => Some(McpErrorCode::ResourceNotFound),
            -32602 => Some(McpErrorCode::InvalidParams),
            -32603 => Some(McpErrorCode::InternalError),
            _ => None,
        }
    }
}

impl Serialize for McpErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for McpErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i32::deserialize(deserializer)?;
        McpErrorCode::from_code(code)
            .ok_or_else(|| D::Error::custom(format!("unknown MCP error code {code}")))
    }
}

/// Structured context attached to an error entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    /// The executed command line (redacted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Process exit code (`-1` for operations that never ran).
    pub exit_code: i32,
    /// Truncated, redacted stderr excerpt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Free-form key/value context (e.g. conflict details).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub additional_data: Map<String, Value>,
}

/// One classified error entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolError {
    /// Stable error code (`CS0103`, `NU1101`, `EXIT_1`, …).
    pub code: String,
    /// The diagnostic message (redacted).
    pub message: String,
    pub category: ErrorCategory,
    /// Human-readable next step; always present.
    pub hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_error_code: Option<McpErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_fixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// The terminal shape every operation produces: success with output, or a
/// non-empty error list. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: i32,
    /// Redacted stdout (success only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ToolError>,
    /// The executed command line (redacted), when the caller supplied it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl CommandResult {
    /// The first error code, if any — convenience for callers that only
    /// branch on the primary failure.
    pub fn primary_code(&self) -> Option<&str> {
        self.errors.first().map(|e| e.code.as_str())
    }
}
