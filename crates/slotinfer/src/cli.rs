//! CLI command implementations.
//!
//! Provides the helpers behind the `slotinfer` subcommands:
//! - `infer` - Infer declarations for decorated initializers (JSON report)
//! - `infer --line` - Infer and install the declaration of one initializer
//! - `emit` - Rewrite sources with the declarations written out
//!
//! ## Error Handling
//!
//! All functions return `Result<T, SlotinferError>`. Inference errors are
//! bridged with [`bridge_slot_error`], which keeps the stable error kind and
//! the source line for JSON output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use slotinfer_core::config::Config;
use slotinfer_core::error::SlotinferError;
use slotinfer_core::files::collect_python_files;
use slotinfer_core::output::{EmitFileReport, FileReport, InferResponse};
use slotinfer_python::{
    emit_source, Emission, FileSlots, InferOptions, SlotError, SlotInferencer,
};
use slotinfer_python_cst::{parse_module, prettify_error};
use tracing::{debug, error, info, info_span};

// ============================================================================
// Configuration
// ============================================================================

/// Load the configuration and apply command-line overrides.
///
/// An explicit `config_path` is loaded as is; otherwise the configuration is
/// discovered upward from `cwd`. Non-empty `decorators` replace the
/// configured decorator names.
pub fn resolve_config(
    config_path: Option<&Path>,
    cwd: &Path,
    decorators: &[String],
) -> Result<Config, SlotinferError> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::discover(cwd)?.1,
    };
    if !decorators.is_empty() {
        config.decorators = decorators.to_vec();
    }
    debug!(decorators = ?config.decorators, "resolved configuration");
    Ok(config)
}

// ============================================================================
// Error Bridging
// ============================================================================

/// Convert an inference error for `file` into the unified error type.
pub fn bridge_slot_error(err: SlotError, file: &str) -> SlotinferError {
    match err {
        SlotError::Parse(e) => SlotinferError::ParseError {
            file: file.to_string(),
            line: e.line(),
            col: e.col(),
            message: e.to_string(),
        },
        SlotError::Io { path, source } if source.kind() == io::ErrorKind::NotFound => {
            SlotinferError::file_not_found(path.display().to_string())
        }
        other => SlotinferError::InferenceError {
            file: file.to_string(),
            line: other.line(),
            kind: other.kind().to_string(),
            message: other.to_string(),
        },
    }
}

/// Log an annotated rendering of a parse error.
fn report_parse_error(err: &SlotError, source: &str, file: &str) {
    if let SlotError::Parse(e) = err {
        error!("\n{}", prettify_error(e, source, file));
    }
}

// ============================================================================
// Inference
// ============================================================================

fn read_source(path: &Path) -> Result<String, SlotinferError> {
    fs::read_to_string(path).map_err(|source| {
        bridge_slot_error(
            SlotError::Io {
                path: path.to_path_buf(),
                source,
            },
            &path.display().to_string(),
        )
    })
}

/// Infer one file, bridging any error.
fn infer_one(path: &Path, options: &InferOptions) -> Result<(String, FileSlots), SlotinferError> {
    let file = path.display().to_string();
    let source = read_source(path)?;
    match slotinfer_python::infer_source(&source, &file, options) {
        Ok(slots) => Ok((source, slots)),
        Err(err) => {
            report_parse_error(&err, &source, &file);
            Err(bridge_slot_error(err, &file))
        }
    }
}

/// Infer every decorated initializer in the given files and directories.
pub fn infer_paths(paths: &[PathBuf], config: &Config) -> Result<InferResponse, SlotinferError> {
    let options = InferOptions::from(config);
    let files = collect_python_files(paths, config)?;
    let mut reports = Vec::with_capacity(files.len());
    for path in &files {
        let _span = info_span!("infer", file = %path.display()).entered();
        let (_, slots) = infer_one(path, &options)?;
        reports.push(slots.to_report());
    }
    info!(files = reports.len(), "inference complete");
    Ok(InferResponse::new(reports))
}

/// Infer and install the declaration of the initializer defined on `line`.
pub fn infer_at_line(path: &Path, line: u32, config: &Config) -> Result<InferResponse, SlotinferError> {
    let options = InferOptions::from(config);
    let file = path.display().to_string();
    let source = read_source(path)?;
    let _span = info_span!("infer_at_line", file = %file, line).entered();

    let module = match parse_module(&source) {
        Ok(module) => module,
        Err(e) => {
            let err = SlotError::from(e);
            report_parse_error(&err, &source, &file);
            return Err(bridge_slot_error(err, &file));
        }
    };
    let mut inferencer = SlotInferencer::new(&module, file.as_str(), &options);
    let declaration = inferencer
        .infer_at_line(line)
        .map_err(|e| bridge_slot_error(e, &file))?;
    let report = FileReport {
        declarations: vec![declaration.to_info(&file)],
        warnings: inferencer.into_warnings(),
        file,
    };
    Ok(InferResponse::new(vec![report]))
}

// ============================================================================
// Emission
// ============================================================================

/// Emission result for one file.
#[derive(Debug)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub file: String,
    pub slots: FileSlots,
    pub emission: Emission,
}

impl EmittedFile {
    /// JSON report for this file.
    pub fn report(&self, written: bool) -> EmitFileReport {
        EmitFileReport {
            file: self.file.clone(),
            changed: self.emission.changed,
            declarations: self
                .slots
                .declarations
                .iter()
                .filter(|d| d.class_name.is_some())
                .count() as u32,
            written,
            diff: self.emission.diff(&self.file),
            warnings: self.slots.warnings.clone(),
        }
    }

    /// Write the emitted source back to the file.
    pub fn write(&self) -> Result<(), SlotinferError> {
        fs::write(&self.path, &self.emission.source).map_err(|e| SlotinferError::ApplyError {
            message: format!("failed to write {}: {}", self.file, e),
            file: Some(self.file.clone()),
        })?;
        info!(file = %self.file, "wrote emitted source");
        Ok(())
    }
}

/// Infer and emit every file under the given paths.
pub fn emit_paths(paths: &[PathBuf], config: &Config) -> Result<Vec<EmittedFile>, SlotinferError> {
    let options = InferOptions::from(config);
    let files = collect_python_files(paths, config)?;
    let mut emitted = Vec::with_capacity(files.len());
    for path in files {
        let _span = info_span!("emit", file = %path.display()).entered();
        let (source, slots) = infer_one(&path, &options)?;
        let emission = emit_source(&source, &slots.declarations).map_err(|e| {
            SlotinferError::internal(format!("emission failed for {}: {}", slots.file, e))
        })?;
        emitted.push(EmittedFile {
            file: slots.file.clone(),
            path,
            slots,
            emission,
        });
    }
    Ok(emitted)
}
