//! slotinfer - static `__slots__` inference for Python classes.
//!
//! This crate provides the CLI binary for slotinfer.
//!
//! ## Modules
//!
//! - `cli` - CLI command implementations

pub mod cli;

// Re-export core types for convenience
pub use slotinfer_core::config::Config;
pub use slotinfer_core::error::{OutputErrorCode, SlotinferError};
pub use slotinfer_core::output::{
    EmitFileReport, EmitResponse, ErrorInfo, ErrorResponse, FileReport, InferResponse,
    SCHEMA_VERSION,
};
pub use slotinfer_python;
