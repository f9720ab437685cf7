//! Slot inference result types.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use slotinfer_core::config::Config;
use slotinfer_core::output::{FileReport, Location, SlotDeclarationInfo, Warning};

// ============================================================================
// SlotList
// ============================================================================

/// A finalized slot declaration value.
///
/// Always strictly sorted (byte-wise, which equals code point order) and free
/// of duplicates, whatever order the names were collected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotList(Vec<String>);

impl SlotList {
    /// The empty declaration, `()`.
    pub fn empty() -> Self {
        SlotList(Vec::new())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Union of two declarations.
    pub fn union(&self, other: &SlotList) -> SlotList {
        self.iter().chain(other.iter()).cloned().collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Python source for the declaration as a tuple display, formatted like
    /// `repr(tuple)`: `()`, `('a',)`, `('a', 'b')`.
    pub fn to_python_tuple(&self) -> String {
        match self.0.as_slice() {
            [] => "()".to_string(),
            [only] => format!("({},)", python_str_repr(only)),
            names => {
                let items: Vec<String> = names.iter().map(|n| python_str_repr(n)).collect();
                format!("({})", items.join(", "))
            }
        }
    }
}

impl FromIterator<String> for SlotList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let set: BTreeSet<String> = iter.into_iter().collect();
        SlotList(set.into_iter().collect())
    }
}

impl<'s> FromIterator<&'s str> for SlotList {
    fn from_iter<I: IntoIterator<Item = &'s str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

impl From<BTreeSet<String>> for SlotList {
    fn from(set: BTreeSet<String>) -> Self {
        SlotList(set.into_iter().collect())
    }
}

impl<'s> IntoIterator for &'s SlotList {
    type Item = &'s String;
    type IntoIter = std::slice::Iter<'s, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SlotList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_python_tuple())
    }
}

/// Python `repr()` of a string: single quotes unless the text contains a
/// single quote and no double quote.
pub fn python_str_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

// ============================================================================
// Declarations
// ============================================================================

/// Line span of the slot decorator on an initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoratorSpan {
    /// Line of the `@`.
    pub line: u32,
    /// Last line of the decorator expression.
    pub end_line: u32,
}

/// The declaration installed for one initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDeclaration {
    /// Class receiving the declaration; `None` for a decorated function that
    /// is not defined directly in a class body.
    pub class_name: Option<String>,
    /// Qualified name of the class (or of the function when there is no class).
    pub qualified_name: String,
    /// Name of the decorated function.
    pub function: String,
    /// Line and column of the `def` keyword.
    pub def_line: u32,
    pub def_col: u32,
    /// Line at which `__slots__` is bound: the first line of the definition,
    /// including decorators.
    pub install_line: u32,
    /// The slot decorator, absent when the initializer was selected by line.
    pub decorator: Option<DecoratorSpan>,
    pub slots: SlotList,
    /// Qualified names of the base classes merged through `super().__init__`.
    pub merged_bases: Vec<String>,
}

impl SlotDeclaration {
    /// Convert to the JSON carrier type.
    pub fn to_info(&self, file: &str) -> SlotDeclarationInfo {
        SlotDeclarationInfo {
            class_name: self.class_name.clone(),
            qualified_name: self.qualified_name.clone(),
            initializer: Location::new(file, self.def_line, self.def_col),
            install_line: self.install_line,
            slots: self.slots.as_slice().to_vec(),
            merged_bases: self.merged_bases.clone(),
        }
    }
}

/// All declarations of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSlots {
    /// File path as given by the caller.
    pub file: String,
    /// Declarations in source order.
    pub declarations: Vec<SlotDeclaration>,
    pub warnings: Vec<Warning>,
}

impl FileSlots {
    pub fn to_report(&self) -> FileReport {
        FileReport {
            file: self.file.clone(),
            declarations: self
                .declarations
                .iter()
                .map(|d| d.to_info(&self.file))
                .collect(),
            warnings: self.warnings.clone(),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Options controlling inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferOptions {
    /// Decorator names (plain or dotted) that mark an initializer.
    pub decorators: Vec<String>,
}

impl Default for InferOptions {
    fn default() -> Self {
        InferOptions::from(&Config::default())
    }
}

impl From<&Config> for InferOptions {
    fn from(config: &Config) -> Self {
        InferOptions {
            decorators: config.decorators.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod slot_list {
        use super::*;

        #[test]
        fn sorted_and_deduplicated() {
            let list: SlotList = ["foo", "bar", "foo", "baz"].into_iter().collect();
            assert_eq!(list.as_slice(), &["bar", "baz", "foo"]);
            assert!(list.contains("baz"));
            assert!(!list.contains("qux"));
        }

        #[test]
        fn byte_order_not_case_folded() {
            let list: SlotList = ["b", "B", "_a", "a"].into_iter().collect();
            assert_eq!(list.as_slice(), &["B", "_a", "a", "b"]);
        }

        #[test]
        fn union_merges() {
            let a: SlotList = ["x", "y"].into_iter().collect();
            let b: SlotList = ["y", "a"].into_iter().collect();
            assert_eq!(a.union(&b).as_slice(), &["a", "x", "y"]);
        }

        #[test]
        fn python_tuple_forms() {
            assert_eq!(SlotList::empty().to_python_tuple(), "()");
            let one: SlotList = ["foo"].into_iter().collect();
            assert_eq!(one.to_python_tuple(), "('foo',)");
            let three: SlotList = ["foo", "bar", "baz"].into_iter().collect();
            assert_eq!(three.to_string(), "('bar', 'baz', 'foo')");
        }

        #[test]
        fn serializes_as_array() {
            let list: SlotList = ["b", "a"].into_iter().collect();
            assert_eq!(serde_json::to_string(&list).unwrap(), r#"["a","b"]"#);
        }
    }

    #[test]
    fn str_repr_quoting() {
        assert_eq!(python_str_repr("plain"), "'plain'");
        assert_eq!(python_str_repr("it's"), "\"it's\"");
        assert_eq!(python_str_repr("both'\""), "'both\\'\"'");
        assert_eq!(python_str_repr("a\\b\n"), "'a\\\\b\\n'");
        assert_eq!(python_str_repr("\u{1}"), "'\\x01'");
    }

    #[test]
    fn declaration_to_info() {
        let decl = SlotDeclaration {
            class_name: Some("Point".to_string()),
            qualified_name: "Point".to_string(),
            function: "__init__".to_string(),
            def_line: 4,
            def_col: 5,
            install_line: 3,
            decorator: Some(DecoratorSpan { line: 3, end_line: 3 }),
            slots: ["y", "x"].into_iter().collect(),
            merged_bases: vec![],
        };
        let info = decl.to_info("geo.py");
        assert_eq!(info.initializer, Location::new("geo.py", 4, 5));
        assert_eq!(info.slots, vec!["x", "y"]);
        assert_eq!(info.install_line, 3);
    }

    #[test]
    fn options_from_config() {
        let config = Config {
            decorators: vec!["auto_slots".to_string()],
            ..Config::default()
        };
        assert_eq!(InferOptions::from(&config).decorators, vec!["auto_slots"]);
        assert_eq!(
            InferOptions::default().decorators,
            vec!["slots", "s", "slot.slots", "slot.s"]
        );
    }
}
