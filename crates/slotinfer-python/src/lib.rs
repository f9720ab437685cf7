//! Python slot inference for slotinfer.
//!
//! This crate infers the `__slots__` declaration of classes whose initializer
//! carries a slot decorator. It includes:
//! - Scope indexing of class and module namespaces
//! - Collection of receiver attribute assignments
//! - Base class slot merging through `super().__init__()` and C3 MRO lookup
//! - Source emission of the inferred declarations

pub mod collector;
pub mod decorators;
pub mod emit;
pub mod error;
pub mod inferencer;
pub mod mro;
pub mod scope;
pub mod types;

use std::fs;
use std::path::Path;

use slotinfer_python_cst::parse_module;
use tracing::debug_span;

pub use emit::{emit_source, Emission};
pub use error::{SlotError, SlotResult};
pub use inferencer::SlotInferencer;
pub use types::{DecoratorSpan, FileSlots, InferOptions, SlotDeclaration, SlotList};

/// Parse `source` and infer every decorated initializer in it.
///
/// `file` is only used for reporting.
pub fn infer_source(source: &str, file: &str, options: &InferOptions) -> SlotResult<FileSlots> {
    let _span = debug_span!("infer_source", file = %file).entered();
    let module = parse_module(source)?;
    let mut inferencer = SlotInferencer::new(&module, file, options);
    let declarations = inferencer.infer_all()?;
    Ok(FileSlots {
        file: file.to_string(),
        declarations,
        warnings: inferencer.into_warnings(),
    })
}

/// Read and infer one file. Returns the source along with the result so that
/// callers can emit without reading twice.
pub fn infer_file(path: &Path, options: &InferOptions) -> SlotResult<(String, FileSlots)> {
    let source = fs::read_to_string(path).map_err(|source| SlotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let slots = infer_source(&source, &path.display().to_string(), options)?;
    Ok((source, slots))
}
