//! Line-granular edits.
//!
//! A [`LineEdit`] replaces a contiguous run of whole lines. Edits carry the
//! text they expect to replace so that stale edits are rejected instead of
//! corrupting the file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::detect_newline;

/// Replace `old_lines` starting at `start_line` with `new_lines`.
///
/// Lines are stored without terminators. An edit with no `old_lines` inserts
/// before `start_line`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    /// First replaced line (1-indexed).
    pub start_line: u32,
    /// Expected current content of the replaced lines.
    pub old_lines: Vec<String>,
    /// Replacement lines.
    pub new_lines: Vec<String>,
}

impl LineEdit {
    /// Create a new edit.
    pub fn new(start_line: u32, old_lines: Vec<String>, new_lines: Vec<String>) -> Self {
        LineEdit {
            start_line,
            old_lines,
            new_lines,
        }
    }

    /// Line after the last replaced line.
    pub fn end_line(&self) -> u32 {
        self.start_line + self.old_lines.len() as u32
    }

    /// Change in line count caused by this edit.
    pub fn line_delta(&self) -> i64 {
        self.new_lines.len() as i64 - self.old_lines.len() as i64
    }
}

/// Errors from applying edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// Two edits touch the same line.
    #[error("overlapping edits at line {line}")]
    Overlap { line: u32 },

    /// An edit starts outside the content.
    #[error("edit at line {line} is out of range")]
    OutOfRange { line: u32 },

    /// The content of a replaced line is not what the edit expects.
    #[error("content mismatch at line {line}")]
    Mismatch { line: u32 },
}

/// Apply edits to content.
///
/// Edits may be given in any order. Replacement lines use the content's
/// newline convention.
pub fn apply_line_edits(content: &str, edits: &[LineEdit]) -> Result<String, PatchError> {
    let newline = detect_newline(content);
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    let mut sorted: Vec<&LineEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.start_line);

    let mut previous_end = 1u32;
    for edit in &sorted {
        if edit.start_line == 0 || edit.start_line as usize > lines.len() + 1 {
            return Err(PatchError::OutOfRange {
                line: edit.start_line,
            });
        }
        if edit.start_line < previous_end {
            return Err(PatchError::Overlap {
                line: edit.start_line,
            });
        }
        if edit.end_line() as usize > lines.len() + 1 {
            return Err(PatchError::OutOfRange {
                line: edit.start_line,
            });
        }
        for (i, expected) in edit.old_lines.iter().enumerate() {
            let actual = strip_terminator(lines[edit.start_line as usize - 1 + i]);
            if actual != expected {
                return Err(PatchError::Mismatch {
                    line: edit.start_line + i as u32,
                });
            }
        }
        previous_end = edit.end_line();
    }

    let mut out = String::with_capacity(content.len());
    let mut next = 0usize;
    for edit in sorted {
        let start = edit.start_line as usize - 1;
        for line in &lines[next..start] {
            out.push_str(line);
        }
        let end = start + edit.old_lines.len();
        // A replaced final line without terminator keeps the file unterminated.
        let unterminated_tail = end == lines.len()
            && end > start
            && !lines[end - 1].ends_with('\n');
        if start == lines.len() && !out.is_empty() && !out.ends_with('\n') {
            out.push_str(newline);
        }
        let count = edit.new_lines.len();
        for (i, new_line) in edit.new_lines.iter().enumerate() {
            out.push_str(new_line);
            if !(unterminated_tail && i + 1 == count) {
                out.push_str(newline);
            }
        }
        next = end;
    }
    for line in &lines[next..] {
        out.push_str(line);
    }
    Ok(out)
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
