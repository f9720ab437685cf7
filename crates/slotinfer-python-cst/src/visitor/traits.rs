// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait definition for syntax tree traversal.

use crate::nodes::{
    AnnAssign, Arg, Assign, Attribute, AugAssign, Call, ClassDef, Decorator, Expression,
    FunctionDef, Module, Name, Param, Statement,
};

/// Result of visiting a node - controls traversal behavior.
///
/// When a visitor method returns a `VisitResult`, it controls how the walker
/// proceeds with traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children.
    ///
    /// After visiting children, `leave_*` will be called for this node.
    #[default]
    Continue,

    /// Skip children, continue with siblings.
    ///
    /// The walker will not descend into this node's children, but `leave_*`
    /// will still be called for this node.
    SkipChildren,

    /// Stop traversal entirely.
    ///
    /// No further `visit_*` or `leave_*` methods will be called. The walk
    /// function will return immediately.
    Stop,
}

/// Read-only traversal of a syntax tree.
///
/// Every method has a default that continues traversal, so implementors
/// override only the nodes they care about. `visit_statement` and
/// `visit_expression` are called for every statement and expression before
/// the node-specific method.
pub trait Visitor<'a> {
    fn visit_module(&mut self, _node: &Module<'a>) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_module(&mut self, _node: &Module<'a>) {}

    fn visit_statement(&mut self, _node: &Statement<'a>) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_statement(&mut self, _node: &Statement<'a>) {}

    fn visit_function_def(&mut self, _node: &FunctionDef<'a>) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_function_def(&mut self, _node: &FunctionDef<'a>) {}

    fn visit_class_def(&mut self, _node: &ClassDef<'a>) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_class_def(&mut self, _node: &ClassDef<'a>) {}

    fn visit_decorator(&mut self, _node: &Decorator<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_param(&mut self, _node: &Param<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_assign(&mut self, _node: &Assign<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_ann_assign(&mut self, _node: &AnnAssign<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_aug_assign(&mut self, _node: &AugAssign<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_expression(&mut self, _node: &Expression<'a>) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_expression(&mut self, _node: &Expression<'a>) {}

    fn visit_name(&mut self, _node: &Name<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_attribute(&mut self, _node: &Attribute<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_call(&mut self, _node: &Call<'a>) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_arg(&mut self, _node: &Arg<'a>) -> VisitResult {
        VisitResult::Continue
    }
}
