//! Error types and error code constants for slotinfer.
//!
//! This module provides a unified error type (`SlotinferError`) that bridges
//! domain-specific errors from different subsystems (parsing, inference,
//! configuration) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input, unparseable source, bad config)
//! - `3`: Resolution errors (inference failures, file not found)
//! - `4`: Apply errors (failed to write emitted source)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, unparseable source).
    InvalidArguments = 2,
    /// Resolution errors (inference failed, file not found).
    ResolutionError = 3,
    /// Apply errors (failed to write changes).
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// All subsystem errors are converted to this type before being rendered as
/// JSON output.
#[derive(Debug, Error)]
pub enum SlotinferError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Source could not be tokenized or parsed.
    #[error("{file}:{line}:{col}: {message}")]
    ParseError {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// Slot inference failed for a decorated initializer.
    #[error("{file}: {message}")]
    InferenceError {
        file: String,
        line: Option<u32>,
        /// Stable machine-readable kind (e.g. `already_declared`).
        kind: String,
        message: String,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration file could not be read or parsed.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failed to write emitted source.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&SlotinferError> for OutputErrorCode {
    fn from(err: &SlotinferError) -> Self {
        match err {
            SlotinferError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            SlotinferError::ParseError { .. } => OutputErrorCode::InvalidArguments,
            SlotinferError::Config { .. } => OutputErrorCode::InvalidArguments,
            SlotinferError::InferenceError { .. } => OutputErrorCode::ResolutionError,
            SlotinferError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            SlotinferError::ApplyError { .. } => OutputErrorCode::ApplyError,
            SlotinferError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<SlotinferError> for OutputErrorCode {
    fn from(err: SlotinferError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl SlotinferError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        SlotinferError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        SlotinferError::FileNotFound { path: path.into() }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        SlotinferError::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SlotinferError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
