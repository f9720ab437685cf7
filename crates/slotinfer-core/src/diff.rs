//! Unified diff generation utilities.
//!
//! Provides a function to generate standard unified diff format from line edits.

use crate::patch::LineEdit;

/// Generate a unified diff for one file from its edits.
///
/// Each edit becomes one hunk without context lines. Hunks are ordered by
/// line, and new-file line numbers account for the line deltas of earlier
/// hunks. Returns an empty string when there are no edits.
pub fn generate_unified_diff(file: &str, edits: &[LineEdit]) -> String {
    if edits.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&LineEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.start_line);

    let mut diff = String::new();
    diff.push_str(&format!("--- a/{}\n", file));
    diff.push_str(&format!("+++ b/{}\n", file));

    let mut delta: i64 = 0;
    for edit in sorted {
        let old_len = edit.old_lines.len();
        let new_len = edit.new_lines.len();
        // Zero-length ranges name the line before the change.
        let old_start = if old_len == 0 {
            edit.start_line as i64 - 1
        } else {
            edit.start_line as i64
        };
        let new_start = if new_len == 0 {
            edit.start_line as i64 + delta - 1
        } else {
            edit.start_line as i64 + delta
        };
        diff.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start, old_len, new_start, new_len
        ));
        for line in &edit.old_lines {
            diff.push_str(&format!("-{}\n", line));
        }
        for line in &edit.new_lines {
            diff.push_str(&format!("+{}\n", line));
        }
        delta += edit.line_delta();
    }

    diff
}

// ============================================================================
// Tests
// ============================================================================
