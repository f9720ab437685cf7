//! Collection of receiver attribute assignments.
//!
//! [`SlotCollector`] walks an initializer and records every attribute name
//! assigned on `self`, together with the superclass delegation calls it makes.
//! The walk is unconditional: assignments in every branch, loop, handler and
//! nested function count.

use std::collections::BTreeSet;

use slotinfer_python_cst::{AnnAssign, Assign, Call, Expression, VisitResult, Visitor};

/// The conventional receiver name.
pub const RECEIVER_NAME: &str = "self";

/// Names and delegation calls found in one initializer.
#[derive(Debug, Default)]
pub struct SlotCollector {
    /// Attribute names assigned on the receiver.
    pub names: BTreeSet<String>,
    /// Lines of `super(...).__init__(...)` calls, in walk order.
    pub super_calls: Vec<u32>,
}

impl SlotCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_target(&mut self, target: &Expression<'_>) {
        match target {
            Expression::Attribute(attr) => {
                if attr.value.as_name().map(|n| n.value) == Some(RECEIVER_NAME) {
                    self.names.insert(attr.attr.value.to_string());
                }
            }
            Expression::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.add_target(element);
                }
            }
            _ => {}
        }
    }
}

impl<'a> Visitor<'a> for SlotCollector {
    fn visit_assign(&mut self, node: &Assign<'a>) -> VisitResult {
        for target in &node.targets {
            self.add_target(target);
        }
        VisitResult::Continue
    }

    fn visit_ann_assign(&mut self, node: &AnnAssign<'a>) -> VisitResult {
        self.add_target(&node.target);
        VisitResult::Continue
    }

    fn visit_call(&mut self, node: &Call<'a>) -> VisitResult {
        if is_super_init_call(node) {
            self.super_calls.push(node.line);
        }
        VisitResult::Continue
    }
}

/// `super(...).__init__(...)`, with any arguments to either call.
pub fn is_super_init_call(call: &Call<'_>) -> bool {
    let Expression::Attribute(method) = call.func.as_ref() else {
        return false;
    };
    if method.attr.value != "__init__" {
        return false;
    }
    let Expression::Call(inner) = method.value.as_ref() else {
        return false;
    };
    inner.func.as_name().map(|n| n.value) == Some("super")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotinfer_python_cst::{parse_module, walk_function_def, Statement};

    fn collect(source: &str) -> SlotCollector {
        let module = parse_module(source).unwrap();
        let Statement::FunctionDef(f) = &module.body[0] else {
            panic!("expected a function");
        };
        let mut collector = SlotCollector::new();
        walk_function_def(&mut collector, f);
        collector
    }

    fn names(collector: &SlotCollector) -> Vec<&str> {
        collector.names.iter().map(String::as_str).collect()
    }

    mod assignments {
        use super::*;

        #[test]
        fn direct_and_annotated() {
            let c = collect(
                "def __init__(self, a):\n    self.x = a\n    self.y: int = 1\n    self.z: str\n",
            );
            assert_eq!(names(&c), vec!["x", "y", "z"]);
        }

        #[test]
        fn chained_targets_all_count() {
            let c = collect("def __init__(self):\n    self.a = self.b = other = 0\n");
            assert_eq!(names(&c), vec!["a", "b"]);
        }

        #[test]
        fn tuple_unpacking_recurses() {
            let c = collect(
                "def __init__(self, baz):\n    self.baz, dummy = baz, Ellipsis\n    (self.p, (self.q, _)), r = v\n",
            );
            assert_eq!(names(&c), vec!["baz", "p", "q"]);
        }

        #[test]
        fn other_target_shapes_are_ignored() {
            let c = collect(
                "\
def __init__(self, other):
    [self.listed] = [1]
    *self.starred, = ()
    self.a.b = 1
    other.x = 2
    self[0] = 3
    self.count += 1
",
            );
            assert!(c.names.is_empty(), "{:?}", c.names);
        }

        #[test]
        fn all_branches_are_visited() {
            let c = collect(
                "\
def __init__(self, flag):
    if flag:
        self.a = 1
    else:
        for i in range(3):
            while False:
                self.b = 2
    try:
        self.c = 3
    except Exception:
        self.d = 4
    with open('f') as fh:
        self.e = fh
    def helper():
        self.f = 5
    g = lambda: None
    class Inner:
        def __init__(inner):
            self.g = 6
",
            );
            assert_eq!(names(&c), vec!["a", "b", "c", "d", "e", "f", "g"]);
        }

        #[test]
        fn duplicates_collapse() {
            let c = collect("def __init__(self):\n    self.x = 1\n    self.x = 2\n");
            assert_eq!(names(&c), vec!["x"]);
        }
    }

    mod delegation {
        use super::*;

        #[test]
        fn zero_and_two_argument_super() {
            let c = collect(
                "def __init__(self):\n    super().__init__()\n    super(Sub, self).__init__(1, k=2)\n",
            );
            assert_eq!(c.super_calls, vec![2, 3]);
        }

        #[test]
        fn other_delegation_styles_are_not_recognized() {
            let c = collect(
                "\
def __init__(self):
    Base.__init__(self)
    parent = super()
    parent.__init__()
    super().setup()
    sup().__init__()
",
            );
            assert!(c.super_calls.is_empty());
        }

        #[test]
        fn nested_super_call_is_found() {
            let c = collect("def __init__(self):\n    if True:\n        x = [super().__init__()]\n");
            assert_eq!(c.super_calls, vec![3]);
        }
    }
}
