//! Shared output types.
//!
//! These are the serialization carriers that language crates convert their
//! results into before they reach the CLI.

use serde::{Deserialize, Serialize};

/// A location in a source file (1-indexed line and column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path as given on the command line.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
        }
    }
}

/// An inferred slot declaration, ready for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDeclarationInfo {
    /// Name of the class receiving the declaration, `null` when the
    /// decorated initializer is not defined in a class body.
    pub class_name: Option<String>,
    /// Dotted scope path of the class (e.g. `outer.Inner`).
    pub qualified_name: String,
    /// Location of the decorated initializer's `def` keyword.
    pub initializer: Location,
    /// Line where the declaration is installed (first decorator line).
    pub install_line: u32,
    /// Sorted, duplicate-free slot names.
    pub slots: Vec<String>,
    /// Base classes whose declarations were merged through `super().__init__`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub merged_bases: Vec<String>,
}
