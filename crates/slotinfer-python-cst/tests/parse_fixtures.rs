// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Parser tests over the Python files in `tests/fixtures/`.
//!
//! Every fixture must parse. A few fixtures are additionally checked for the
//! shape of the tree the slot inference relies on.

use std::path::PathBuf;

use slotinfer_python_cst::{
    parse_module, prettify_error, walk_module, Attribute, Expression, Module, Statement,
    VisitResult, Visitor,
};

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {:?}: {}", path, e))
}

fn parse_or_panic<'a>(source: &'a str, label: &str) -> Module<'a> {
    match parse_module(source) {
        Ok(m) => m,
        Err(e) => panic!("{}", prettify_error(&e, source, label)),
    }
}

/// Collects `self.<attr>` targets of assignments.
#[derive(Default)]
struct SelfTargets {
    attrs: Vec<String>,
}

impl<'a> Visitor<'a> for SelfTargets {
    fn visit_statement(&mut self, node: &Statement<'a>) -> VisitResult {
        let targets: Vec<&Expression<'a>> = match node {
            Statement::Assign(a) => a.targets.iter().collect(),
            Statement::AnnAssign(a) => vec![&a.target],
            _ => return VisitResult::Continue,
        };
        for target in targets {
            self.collect(target);
        }
        VisitResult::Continue
    }
}

impl SelfTargets {
    fn collect(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::Attribute(Attribute { value, attr }) => {
                if value.as_name().map(|n| n.value) == Some("self") {
                    self.attrs.push(attr.value.to_string());
                }
            }
            Expression::Tuple(t) => t.elements.iter().for_each(|e| self.collect(e)),
            _ => {}
        }
    }
}

#[test]
fn all_fixtures_parse() {
    let entries = fixtures_dir().read_dir().expect("read_dir");
    let mut count = 0;
    for entry in entries {
        let path = entry.expect("dir entry").path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        let source = std::fs::read_to_string(&path).expect("reading file");
        let module = parse_or_panic(&source, &path.display().to_string());
        assert!(!module.body.is_empty(), "{:?} parsed to an empty module", path);
        count += 1;
    }
    assert!(count >= 3, "expected fixtures in {:?}", fixtures_dir());
}

#[test]
fn slotted_classes_self_targets() {
    let source = read_fixture("slotted_classes.py");
    let module = parse_or_panic(&source, "slotted_classes.py");

    let mut visitor = SelfTargets::default();
    walk_module(&mut visitor, &module);
    assert_eq!(
        visitor.attrs,
        vec!["foo", "bar", "baz", "scale", "label", "big", "small"]
    );
}

#[test]
fn slotted_classes_structure() {
    let source = read_fixture("slotted_classes.py");
    let module = parse_or_panic(&source, "slotted_classes.py");

    let classes: Vec<(&str, u32, usize)> = module
        .body
        .iter()
        .filter_map(|s| match s {
            Statement::ClassDef(c) => Some((c.name.value, c.line, c.bases.len())),
            _ => None,
        })
        .collect();
    assert_eq!(
        classes,
        vec![("Base", 5, 0), ("Child", 11, 1), ("Annotated", 18, 1)]
    );

    let Statement::ClassDef(child) = &module.body[3] else {
        panic!("expected Child");
    };
    let Statement::FunctionDef(init) = &child.body[0] else {
        panic!("expected __init__");
    };
    assert_eq!(init.name.value, "__init__");
    assert_eq!(init.first_line(), 12);
    assert_eq!(init.line, 13);
    assert_eq!(
        init.decorators[0].dotted_name().as_deref(),
        Some("slotlib.slots")
    );
}

#[test]
fn control_flow_top_level_statements() {
    let source = read_fixture("control_flow.py");
    let module = parse_or_panic(&source, "control_flow.py");

    let kinds: Vec<&str> = module
        .body
        .iter()
        .map(|s| match s {
            Statement::Expr(_) => "expr",
            Statement::Import(_) => "import",
            Statement::ImportFrom(_) => "from",
            Statement::AnnAssign(_) => "annassign",
            Statement::Assign(_) => "assign",
            Statement::AugAssign(_) => "augassign",
            Statement::FunctionDef(_) => "def",
            Statement::ClassDef(_) => "class",
            Statement::Other(o) => o.keyword,
            _ => "?",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "expr",
            "import",
            "from",
            "from",
            "annassign",
            "assign",
            "augassign",
            "def",
            "def",
            "def",
            "type",
            "class",
        ]
    );
}
