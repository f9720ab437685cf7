// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor infrastructure for syntax tree traversal.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for `visit_*` methods
//! - **Post-order** for `leave_*` methods
//! - Children are visited in source order, except that the body of a
//!   conditional expression is visited before its test
//!
//! # Visitor Pattern
//!
//! ```
//! use slotinfer_python_cst::{parse_module, walk_module, Name, VisitResult, Visitor};
//!
//! struct NameCounter {
//!     count: usize,
//! }
//!
//! impl<'a> Visitor<'a> for NameCounter {
//!     fn visit_name(&mut self, _node: &Name<'a>) -> VisitResult {
//!         self.count += 1;
//!         VisitResult::Continue
//!     }
//! }
//!
//! let module = parse_module("x = y + z\n").unwrap();
//! let mut counter = NameCounter { count: 0 };
//! walk_module(&mut counter, &module);
//! assert_eq!(counter.count, 3);
//! ```

mod dispatch;
mod traits;

pub use dispatch::{
    walk_ann_assign, walk_arg, walk_assign, walk_attribute, walk_aug_assign, walk_body,
    walk_call, walk_class_def, walk_decorator, walk_expression, walk_function_def, walk_module,
    walk_parameters, walk_statement,
};
pub use traits::{VisitResult, Visitor};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Call, ClassDef, FunctionDef, Statement};
    use crate::parse_module;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip_functions: bool,
        stop_at_call: bool,
    }

    impl<'a> Visitor<'a> for Recorder {
        fn visit_function_def(&mut self, node: &FunctionDef<'a>) -> VisitResult {
            self.events.push(format!("def {}", node.name.value));
            if self.skip_functions {
                VisitResult::SkipChildren
            } else {
                VisitResult::Continue
            }
        }

        fn leave_function_def(&mut self, node: &FunctionDef<'a>) {
            self.events.push(format!("end {}", node.name.value));
        }

        fn visit_class_def(&mut self, node: &ClassDef<'a>) -> VisitResult {
            self.events.push(format!("class {}", node.name.value));
            VisitResult::Continue
        }

        fn visit_call(&mut self, _node: &Call<'a>) -> VisitResult {
            self.events.push("call".to_string());
            if self.stop_at_call {
                VisitResult::Stop
            } else {
                VisitResult::Continue
            }
        }

        fn visit_statement(&mut self, node: &Statement<'a>) -> VisitResult {
            if let Statement::Assign(a) = node {
                self.events.push(format!("assign@{}", a.line));
            }
            VisitResult::Continue
        }
    }

    const SOURCE: &str = "\
class A:
    def f(self):
        x = g()
        def inner():
            pass
y = 1
";

    #[test]
    fn visits_in_source_order() {
        let module = parse_module(SOURCE).unwrap();
        let mut recorder = Recorder::default();
        assert_eq!(walk_module(&mut recorder, &module), VisitResult::Continue);
        assert_eq!(
            recorder.events,
            vec![
                "class A", "def f", "assign@3", "call", "def inner", "end inner", "end f",
                "assign@6",
            ]
        );
    }

    #[test]
    fn skip_children_still_leaves() {
        let module = parse_module(SOURCE).unwrap();
        let mut recorder = Recorder {
            skip_functions: true,
            ..Recorder::default()
        };
        walk_module(&mut recorder, &module);
        assert_eq!(recorder.events, vec!["class A", "def f", "end f", "assign@6"]);
    }

    #[test]
    fn stop_unwinds_the_walk() {
        let module = parse_module(SOURCE).unwrap();
        let mut recorder = Recorder {
            stop_at_call: true,
            ..Recorder::default()
        };
        assert_eq!(walk_module(&mut recorder, &module), VisitResult::Stop);
        assert_eq!(recorder.events, vec!["class A", "def f", "assign@3", "call"]);
    }
}
