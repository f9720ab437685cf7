//! Errors raised while inferring slot declarations.
//!
//! Every variant is fatal for the file being analyzed: the first error aborts
//! the analysis and nothing is installed.

use std::path::PathBuf;

use slotinfer_python_cst::ParserError;
use thiserror::Error;

/// Errors that can occur during slot inference.
#[derive(Debug, Error)]
pub enum SlotError {
    /// The namespace of the decorated function already binds `__slots__`,
    /// either explicitly or through an earlier decorated function.
    #[error("__slots__ already declared in {scope} (line {previous_line})")]
    AlreadyDeclared {
        scope: String,
        line: u32,
        previous_line: u32,
    },

    /// No function definition starts at the requested line.
    #[error("no function definition at line {line}")]
    FunctionNotFound { line: u32 },

    /// A `super().__init__(...)` call appears in a function that is not
    /// defined directly in a class body.
    #[error("class definition containing {function} not found")]
    EnclosingClassNotFound { function: String, line: u32 },

    /// A base class expression is not a plain name.
    #[error("base class expression of {class} is not supported")]
    UnsupportedBase { class: String, line: u32 },

    /// A base class name is bound neither in the class body nor in the module.
    #[error("name '{name}' is not defined")]
    UnresolvedName { name: String, line: u32 },

    /// The resolved base class has no `__slots__` anywhere in its MRO.
    #[error("base class {name} does not have __slots__")]
    MissingSlots { name: String, line: u32 },

    /// A base name is bound, but not to a class defined in this file.
    #[error("base class {name} is not a class defined in this module")]
    OpaqueBase { name: String, line: u32 },

    /// The `__slots__` of a class is not a statically known sequence of names.
    #[error("__slots__ of {class} cannot be evaluated statically")]
    OpaqueSlots { class: String, line: u32 },

    /// The class hierarchy has no consistent linearization or refers to itself.
    #[error("inconsistent or cyclic inheritance for class {class}")]
    CyclicInheritance { class: String, line: u32 },

    /// The source could not be tokenized or parsed.
    #[error("{0}")]
    Parse(#[from] ParserError),

    /// The source file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SlotError {
    /// Stable machine-readable kind, used in JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            SlotError::AlreadyDeclared { .. } => "already_declared",
            SlotError::FunctionNotFound { .. } => "function_not_found",
            SlotError::EnclosingClassNotFound { .. } => "enclosing_class_not_found",
            SlotError::UnsupportedBase { .. } => "unsupported_base",
            SlotError::UnresolvedName { .. } => "unresolved_name",
            SlotError::MissingSlots { .. } => "missing_slots",
            SlotError::OpaqueBase { .. } => "opaque_base",
            SlotError::OpaqueSlots { .. } => "opaque_slots",
            SlotError::CyclicInheritance { .. } => "cyclic_inheritance",
            SlotError::Parse(_) => "parse_error",
            SlotError::Io { .. } => "io_error",
        }
    }

    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<u32> {
        match self {
            SlotError::AlreadyDeclared { line, .. }
            | SlotError::FunctionNotFound { line }
            | SlotError::EnclosingClassNotFound { line, .. }
            | SlotError::UnsupportedBase { line, .. }
            | SlotError::UnresolvedName { line, .. }
            | SlotError::MissingSlots { line, .. }
            | SlotError::OpaqueBase { line, .. }
            | SlotError::OpaqueSlots { line, .. }
            | SlotError::CyclicInheritance { line, .. } => Some(*line),
            SlotError::Parse(e) => Some(e.line()),
            SlotError::Io { .. } => None,
        }
    }
}

/// Result type for slot inference.
pub type SlotResult<T> = Result<T, SlotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_condition() {
        let err = SlotError::AlreadyDeclared {
            scope: "Point".to_string(),
            line: 7,
            previous_line: 3,
        };
        assert_eq!(err.to_string(), "__slots__ already declared in Point (line 3)");
        assert_eq!(err.kind(), "already_declared");
        assert_eq!(err.line(), Some(7));

        let err = SlotError::MissingSlots {
            name: "Base".to_string(),
            line: 12,
        };
        assert_eq!(err.to_string(), "base class Base does not have __slots__");
    }

    #[test]
    fn parse_errors_carry_their_line() {
        let err: SlotError = slotinfer_python_cst::parse_module("x = (\n")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "parse_error");
        assert!(err.line().is_some());
    }

    #[test]
    fn io_errors_have_no_line() {
        let err = SlotError::Io {
            path: PathBuf::from("missing.py"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.line(), None);
        assert!(err.to_string().starts_with("cannot read missing.py"));
    }
}
