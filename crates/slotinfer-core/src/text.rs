//! Text utilities for line-oriented source rewriting.

/// Leading whitespace of a line.
pub fn line_indent(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// Newline convention of the content: `"\r\n"` if its first line ends that way.
pub fn detect_newline(content: &str) -> &'static str {
    match content.find('\n') {
        Some(i) if i > 0 && content.as_bytes()[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

/// Split content into lines, stripping `\n` / `\r\n` terminators.
///
/// A trailing newline does not produce an empty final line.
pub fn split_lines(content: &str) -> Vec<&str> {
    content
        .split_inclusive('\n')
        .map(|l| {
            let l = l.strip_suffix('\n').unwrap_or(l);
            l.strip_suffix('\r').unwrap_or(l)
        })
        .collect()
}
