//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Structured JSON:** All structured CLI output is valid JSON; `emit` may output plain
//!    unified diff or rewritten source instead
//! 2. **Status first:** Every response has `status` as first field
//! 3. **Deterministic:** Same input -> same output (field order, array ordering)
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, SlotinferError};

pub use crate::types::{Location, SlotDeclarationInfo};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// Warning information for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the warning applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Warning {
    /// Create a warning with location.
    pub fn with_location(
        code: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: Some(location),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
///
/// - `code`: Numeric error code (required)
/// - `message`: Human-readable message (required)
/// - `details`: Error-specific structured data (optional)
/// - `location`: Where the error occurred (optional)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    /// Create from a SlotinferError.
    pub fn from_error(err: &SlotinferError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            SlotinferError::ParseError {
                file, line, col, ..
            } => (None, Some(Location::new(file.clone(), *line, *col))),
            SlotinferError::InferenceError {
                file, line, kind, ..
            } => (
                Some(serde_json::json!({ "kind": kind })),
                line.map(|line| Location::new(file.clone(), line, 1)),
            ),
            SlotinferError::FileNotFound { path } => {
                (Some(serde_json::json!({ "path": path })), None)
            }
            SlotinferError::ApplyError { file, .. } => {
                let details = file.as_ref().map(|f| serde_json::json!({ "file": f }));
                (details, None)
            }
            _ => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// Error details.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a SlotinferError.
    pub fn from_error(err: &SlotinferError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Response Structs
// ============================================================================

/// Inference results for one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// File path as given on the command line.
    pub file: String,
    /// Declarations in source order.
    pub declarations: Vec<SlotDeclarationInfo>,
    /// Non-fatal findings.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<Warning>,
}

/// Response for the `infer` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// Per-file results, sorted by path.
    pub files: Vec<FileReport>,
}

impl InferResponse {
    /// Create a new infer response.
    pub fn new(files: Vec<FileReport>) -> Self {
        InferResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files,
        }
    }
}

/// Emission outcome for one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitFileReport {
    /// File path as given on the command line.
    pub file: String,
    /// Whether the emitted source differs from the input.
    pub changed: bool,
    /// Number of declarations installed.
    pub declarations: u32,
    /// Whether the file was written back.
    pub written: bool,
    /// Unified diff of the change (empty when unchanged).
    pub diff: String,
    /// Non-fatal findings.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<Warning>,
}

/// Response for the `emit` command in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitResponse {
    /// `"ok"`, or `"changes_needed"` in check mode when any file would change.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// Per-file results, sorted by path.
    pub files: Vec<EmitFileReport>,
}

impl EmitResponse {
    /// Create a new emit response.
    pub fn new(status: impl Into<String>, files: Vec<EmitFileReport>) -> Self {
        EmitResponse {
            status: status.into(),
            schema_version: SCHEMA_VERSION.to_string(),
            files,
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_declaration() -> SlotDeclarationInfo {
        SlotDeclarationInfo {
            class_name: Some("Point".to_string()),
            qualified_name: "Point".to_string(),
            initializer: Location::new("geo.py", 3, 5),
            install_line: 2,
            slots: vec!["x".to_string(), "y".to_string()],
            merged_bases: vec![],
        }
    }

    mod error_info {
        use super::*;

        #[test]
        fn inference_error_carries_kind_and_location() {
            let err = SlotinferError::InferenceError {
                file: "geo.py".to_string(),
                line: Some(7),
                kind: "unresolved_name".to_string(),
                message: "name 'Base' is not defined".to_string(),
            };
            let info = ErrorInfo::from_error(&err);
            assert_eq!(info.code, 3);
            assert_eq!(info.details.unwrap()["kind"], "unresolved_name");
            assert_eq!(info.location.unwrap().line, 7);
        }

        #[test]
        fn internal_error_has_no_details() {
            let info = ErrorInfo::from_error(&SlotinferError::internal("boom"));
            assert!(info.details.is_none());
            assert!(info.location.is_none());
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn status_is_first_field() {
            let response = InferResponse::new(vec![]);
            let json = serde_json::to_string(&response).unwrap();
            assert!(json.starts_with("{\"status\":\"ok\""));
        }

        #[test]
        fn empty_merged_bases_are_omitted() {
            let json = serde_json::to_string(&sample_declaration()).unwrap();
            assert!(!json.contains("merged_bases"));
        }

        #[test]
        fn emit_response_is_deterministic() {
            let response = InferResponse::new(vec![FileReport {
                file: "geo.py".to_string(),
                declarations: vec![sample_declaration()],
                warnings: vec![],
            }]);

            let mut output1 = Vec::new();
            let mut output2 = Vec::new();
            emit_response(&response, &mut output1).unwrap();
            emit_response(&response, &mut output2).unwrap();

            assert_eq!(output1, output2);
            let parsed: serde_json::Value = serde_json::from_slice(&output1).unwrap();
            assert_eq!(parsed["files"][0]["declarations"][0]["slots"][1], "y");
        }
    }
}
