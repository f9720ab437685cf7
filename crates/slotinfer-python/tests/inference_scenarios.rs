// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! End-to-end inference over fixture modules.
//!
//! Each test infers a complete module, then checks the declarations and the
//! emitted source.

use std::fs;
use std::path::PathBuf;

use slotinfer_python::{emit_source, infer_file, infer_source, InferOptions, SlotError};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn slots_by_class(file: &str) -> Vec<(String, Vec<String>)> {
    let (_, slots) = infer_file(&fixture(file), &InferOptions::default()).unwrap();
    slots
        .declarations
        .into_iter()
        .map(|d| (d.qualified_name, d.slots.into_vec()))
        .collect()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// ============================================================================
// Inheritance chains
// ============================================================================

mod inheritance_chain {
    use super::*;

    #[test]
    fn subclass_merges_all_bases() {
        assert_eq!(
            slots_by_class("inheritance_chain.py"),
            vec![
                ("BaseClass".to_string(), strings(&["foo"])),
                ("SubClass".to_string(), strings(&["bar", "baz", "foo"])),
            ]
        );
    }

    #[test]
    fn emitted_declarations() {
        let path = fixture("inheritance_chain.py");
        let (source, slots) = infer_file(&path, &InferOptions::default()).unwrap();
        let emission = emit_source(&source, &slots.declarations).unwrap();
        assert!(emission.changed);
        assert!(!emission.source.contains("@slots"));
        assert!(emission
            .source
            .contains("        __slots__ = ('bar', 'baz', 'foo')\n        def __init__(self, baz=2):\n"));
        assert!(emission
            .source
            .contains("        __slots__ = ('foo',)\n        def __init__(self):\n"));
        assert!(emission.source.contains("        __slots__ = BaseClass.__slots__\n"));
    }

    #[test]
    fn emitted_source_is_stable() {
        let path = fixture("inheritance_chain.py");
        let (source, slots) = infer_file(&path, &InferOptions::default()).unwrap();
        let emission = emit_source(&source, &slots.declarations).unwrap();

        let again = infer_source(&emission.source, "emitted.py", &InferOptions::default()).unwrap();
        assert!(again.declarations.is_empty());
        assert!(!emit_source(&emission.source, &again.declarations)
            .unwrap()
            .changed);
    }
}

mod alias_decorators {
    use super::*;

    #[test]
    fn dotted_decorators_and_annotated_assignments() {
        assert_eq!(
            slots_by_class("shapes.py"),
            vec![
                ("Point".to_string(), strings(&["name", "x", "y"])),
                (
                    "Circle".to_string(),
                    strings(&["_area", "_perimeter", "name", "radius", "x", "y"])
                ),
            ]
        );
    }

    #[test]
    fn merged_bases_follow_declaration_order() {
        let (_, slots) = infer_file(&fixture("shapes.py"), &InferOptions::default()).unwrap();
        let merged: Vec<&[String]> = slots
            .declarations
            .iter()
            .map(|d| d.merged_bases.as_slice())
            .collect();
        assert_eq!(merged, vec![&strings(&["Shape"])[..], &strings(&["Point"])[..]]);
    }
}

// ============================================================================
// Library base classes
// ============================================================================

mod library_bases {
    use super::*;

    #[test]
    fn declaring_ancestor_stops_the_lookup() {
        assert_eq!(
            slots_by_class("library_bases.py"),
            vec![
                ("Square".to_string(), strings(&["name", "side"])),
                ("MissingKey".to_string(), strings(&["code", "key"])),
                ("LabelledCrate".to_string(), strings(&["item", "label"])),
            ]
        );
    }

    #[test]
    fn lookup_past_a_library_base_fails() {
        let source = "\
from abc import ABC

class Shape(ABC):
    pass

class Square(Shape):
    pass

class Tile(Square):
    @slots
    def __init__(self):
        super().__init__()
";
        let err = infer_source(source, "tile.py", &InferOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "opaque_base");
        assert_eq!(err.line(), Some(3));
    }
}

// ============================================================================
// Files and failures
// ============================================================================

mod files {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = infer_file(&dir.path().join("absent.py"), &InferOptions::default()).unwrap_err();
        assert!(matches!(err, SlotError::Io { .. }));
        assert_eq!(err.kind(), "io_error");
    }

    #[test]
    fn parse_errors_carry_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.py");
        fs::write(&path, "class A:\n    @slots\n    def __init__(self) pass\n").unwrap();
        let err = infer_file(&path, &InferOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn first_error_aborts_the_file() {
        let source = "\
class A:
    @slots
    def __init__(self):
        self.a = 1

class B(Missing):
    @slots
    def __init__(self):
        super().__init__()
";
        let err = infer_source(source, "abort.py", &InferOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "unresolved_name");
        assert_eq!(err.line(), Some(6));
    }

    #[test]
    fn report_serializes_sorted_slots() {
        let slots = infer_source(
            "class A:\n    @slots\n    def __init__(self):\n        self.z = self.a = 0\n",
            "report.py",
            &InferOptions::default(),
        )
        .unwrap();
        let json = serde_json::to_value(slots.to_report()).unwrap();
        assert_eq!(json["file"], "report.py");
        assert_eq!(json["declarations"][0]["slots"], serde_json::json!(["a", "z"]));
        assert_eq!(json["declarations"][0]["install_line"], 2);
    }
}
