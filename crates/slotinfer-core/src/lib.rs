//! Core infrastructure for slotinfer.
//!
//! This crate provides language-agnostic infrastructure:
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Configuration loading
//! - Source file discovery
//! - Line edits and unified diff generation
//! - Text utilities

pub mod config;
pub mod diff;
pub mod error;
pub mod files;
pub mod output;
pub mod patch;
pub mod text;
pub mod types;
