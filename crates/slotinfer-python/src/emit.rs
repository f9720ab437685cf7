//! Source emission.
//!
//! Rewrites a module so that every installed declaration is written out as a
//! class-level `__slots__` assignment. The assignment goes on the first line
//! of the initializer's definition, with its indentation, and the slot
//! decorator itself is removed. Other decorators stay in place.
//!
//! ```text
//! class Point:                       class Point:
//!     @slots                             __slots__ = ('x', 'y')
//!     def __init__(self, x, y):          def __init__(self, x, y):
//!         self.x = x                         self.x = x
//!         self.y = y                         self.y = y
//! ```

use slotinfer_core::diff::generate_unified_diff;
use slotinfer_core::patch::{apply_line_edits, LineEdit, PatchError};
use slotinfer_core::text::{line_indent, split_lines};
use tracing::debug;

use crate::scope::SLOTS_NAME;
use crate::types::SlotDeclaration;

/// Rewritten source together with the edits that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub source: String,
    pub edits: Vec<LineEdit>,
    /// Whether `source` differs from the input.
    pub changed: bool,
}

impl Emission {
    /// Unified diff of the edits, empty when nothing changed.
    pub fn diff(&self, file: &str) -> String {
        generate_unified_diff(file, &self.edits)
    }
}

/// The edit writing out one declaration, `None` for declarations that were
/// not installed into a class.
pub fn declaration_edit(
    lines: &[&str],
    declaration: &SlotDeclaration,
) -> Result<Option<LineEdit>, PatchError> {
    if declaration.class_name.is_none() {
        return Ok(None);
    }
    let start = declaration.install_line;
    let end = declaration
        .decorator
        .map_or(start, |d| d.end_line.max(start));
    if start == 0 || end as usize > lines.len() {
        return Err(PatchError::OutOfRange { line: start });
    }

    let old_lines: Vec<String> = lines[start as usize - 1..end as usize]
        .iter()
        .map(|l| l.to_string())
        .collect();
    let indent = line_indent(&old_lines[0]).to_string();

    let mut new_lines = Vec::with_capacity(old_lines.len());
    new_lines.push(format!(
        "{}{} = {}",
        indent,
        SLOTS_NAME,
        declaration.slots.to_python_tuple()
    ));
    for (offset, line) in old_lines.iter().enumerate() {
        let line_no = start + offset as u32;
        let in_decorator = declaration
            .decorator
            .is_some_and(|d| (d.line..=d.end_line).contains(&line_no));
        if !in_decorator {
            new_lines.push(line.clone());
        }
    }

    Ok(Some(LineEdit::new(start, old_lines, new_lines)))
}

/// Rewrite `source` with every declaration written out.
pub fn emit_source(
    source: &str,
    declarations: &[SlotDeclaration],
) -> Result<Emission, PatchError> {
    let lines = split_lines(source);
    let mut edits = Vec::new();
    for declaration in declarations {
        if let Some(edit) = declaration_edit(&lines, declaration)? {
            debug!(
                class = %declaration.qualified_name,
                line = edit.start_line,
                "emitting __slots__ assignment"
            );
            edits.push(edit);
        }
    }

    let rewritten = apply_line_edits(source, &edits)?;
    let changed = rewritten != source;
    Ok(Emission {
        source: rewritten,
        edits,
        changed,
    })
}
