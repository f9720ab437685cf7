// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions for syntax tree traversal.
//!
//! Each `walk_*` function calls the visitor's `visit_*` method, descends into
//! the children in source order unless told otherwise, and then calls the
//! matching `leave_*` method where one exists. A [`VisitResult::Stop`] from
//! any visitor method unwinds the whole walk.

use crate::nodes::{
    AnnAssign, Arg, Assign, Attribute, AugAssign, Call, ClassDef, Decorator, DictItem,
    Expression, FunctionDef, Module, Parameters, Statement,
};

use super::traits::{VisitResult, Visitor};

/// Return `Stop` from the enclosing walk function if the child walk stopped.
macro_rules! walk_child {
    ($e:expr) => {
        if $e == VisitResult::Stop {
            return VisitResult::Stop;
        }
    };
}

/// Walk a [`Module`] node.
pub fn walk_module<'a, V: Visitor<'a>>(visitor: &mut V, node: &Module<'a>) -> VisitResult {
    match visitor.visit_module(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            walk_child!(walk_body(visitor, &node.body));
        }
    }
    visitor.leave_module(node);
    VisitResult::Continue
}

/// Walk a sequence of statements.
pub fn walk_body<'a, V: Visitor<'a>>(visitor: &mut V, body: &[Statement<'a>]) -> VisitResult {
    for stmt in body {
        walk_child!(walk_statement(visitor, stmt));
    }
    VisitResult::Continue
}

// ============================================================================
// Statement walks
// ============================================================================

/// Walk a [`Statement`] node.
pub fn walk_statement<'a, V: Visitor<'a>>(visitor: &mut V, node: &Statement<'a>) -> VisitResult {
    match visitor.visit_statement(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            walk_child!(walk_statement_children(visitor, node));
        }
    }
    visitor.leave_statement(node);
    VisitResult::Continue
}

fn walk_statement_children<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &Statement<'a>,
) -> VisitResult {
    match node {
        Statement::FunctionDef(f) => walk_function_def(visitor, f),
        Statement::ClassDef(c) => walk_class_def(visitor, c),
        Statement::Assign(a) => walk_assign(visitor, a),
        Statement::AnnAssign(a) => walk_ann_assign(visitor, a),
        Statement::AugAssign(a) => walk_aug_assign(visitor, a),
        Statement::Expr(e) => walk_expression(visitor, &e.value),
        Statement::Return(r) => match &r.value {
            Some(value) => walk_expression(visitor, value),
            None => VisitResult::Continue,
        },
        Statement::If(s) => {
            walk_child!(walk_expression(visitor, &s.test));
            walk_child!(walk_body(visitor, &s.body));
            walk_body(visitor, &s.orelse)
        }
        Statement::While(s) => {
            walk_child!(walk_expression(visitor, &s.test));
            walk_child!(walk_body(visitor, &s.body));
            walk_body(visitor, &s.orelse)
        }
        Statement::For(s) => {
            walk_child!(walk_expression(visitor, &s.target));
            walk_child!(walk_expression(visitor, &s.iter));
            walk_child!(walk_body(visitor, &s.body));
            walk_body(visitor, &s.orelse)
        }
        Statement::With(s) => {
            for item in &s.items {
                walk_child!(walk_expression(visitor, &item.context));
                if let Some(target) = &item.target {
                    walk_child!(walk_expression(visitor, target));
                }
            }
            walk_body(visitor, &s.body)
        }
        Statement::Try(s) => {
            walk_child!(walk_body(visitor, &s.body));
            for handler in &s.handlers {
                if let Some(kind) = &handler.kind {
                    walk_child!(walk_expression(visitor, kind));
                }
                walk_child!(walk_body(visitor, &handler.body));
            }
            walk_child!(walk_body(visitor, &s.orelse));
            walk_body(visitor, &s.finalbody)
        }
        Statement::Match(s) => {
            walk_child!(walk_expression(visitor, &s.subject));
            for case in &s.cases {
                if let Some(guard) = &case.guard {
                    walk_child!(walk_expression(visitor, guard));
                }
                walk_child!(walk_body(visitor, &case.body));
            }
            VisitResult::Continue
        }
        Statement::Import(_) | Statement::ImportFrom(_) => VisitResult::Continue,
        Statement::Other(s) => {
            for expr in &s.exprs {
                walk_child!(walk_expression(visitor, expr));
            }
            VisitResult::Continue
        }
    }
}

/// Walk a [`FunctionDef`] node: decorators, parameters, return annotation, body.
pub fn walk_function_def<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &FunctionDef<'a>,
) -> VisitResult {
    match visitor.visit_function_def(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for dec in &node.decorators {
                walk_child!(walk_decorator(visitor, dec));
            }
            walk_child!(walk_parameters(visitor, &node.params));
            if let Some(returns) = &node.returns {
                walk_child!(walk_expression(visitor, returns));
            }
            walk_child!(walk_body(visitor, &node.body));
        }
    }
    visitor.leave_function_def(node);
    VisitResult::Continue
}

/// Walk a [`ClassDef`] node: decorators, bases, keywords, body.
pub fn walk_class_def<'a, V: Visitor<'a>>(visitor: &mut V, node: &ClassDef<'a>) -> VisitResult {
    match visitor.visit_class_def(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for dec in &node.decorators {
                walk_child!(walk_decorator(visitor, dec));
            }
            for base in &node.bases {
                walk_child!(walk_expression(visitor, base));
            }
            for keyword in &node.keywords {
                walk_child!(walk_arg(visitor, keyword));
            }
            walk_child!(walk_body(visitor, &node.body));
        }
    }
    visitor.leave_class_def(node);
    VisitResult::Continue
}

pub fn walk_decorator<'a, V: Visitor<'a>>(visitor: &mut V, node: &Decorator<'a>) -> VisitResult {
    match visitor.visit_decorator(node) {
        VisitResult::Stop => VisitResult::Stop,
        VisitResult::SkipChildren => VisitResult::Continue,
        VisitResult::Continue => walk_expression(visitor, &node.expr),
    }
}

/// Walk parameter annotations and defaults.
pub fn walk_parameters<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &Parameters<'a>,
) -> VisitResult {
    for param in &node.params {
        match visitor.visit_param(param) {
            VisitResult::Stop => return VisitResult::Stop,
            VisitResult::SkipChildren => continue,
            VisitResult::Continue => {}
        }
        if let Some(annotation) = &param.annotation {
            walk_child!(walk_expression(visitor, annotation));
        }
        if let Some(default) = &param.default {
            walk_child!(walk_expression(visitor, default));
        }
    }
    VisitResult::Continue
}

pub fn walk_assign<'a, V: Visitor<'a>>(visitor: &mut V, node: &Assign<'a>) -> VisitResult {
    match visitor.visit_assign(node) {
        VisitResult::Stop => VisitResult::Stop,
        VisitResult::SkipChildren => VisitResult::Continue,
        VisitResult::Continue => {
            for target in &node.targets {
                walk_child!(walk_expression(visitor, target));
            }
            walk_expression(visitor, &node.value)
        }
    }
}

pub fn walk_ann_assign<'a, V: Visitor<'a>>(visitor: &mut V, node: &AnnAssign<'a>) -> VisitResult {
    match visitor.visit_ann_assign(node) {
        VisitResult::Stop => VisitResult::Stop,
        VisitResult::SkipChildren => VisitResult::Continue,
        VisitResult::Continue => {
            walk_child!(walk_expression(visitor, &node.target));
            walk_child!(walk_expression(visitor, &node.annotation));
            match &node.value {
                Some(value) => walk_expression(visitor, value),
                None => VisitResult::Continue,
            }
        }
    }
}

pub fn walk_aug_assign<'a, V: Visitor<'a>>(visitor: &mut V, node: &AugAssign<'a>) -> VisitResult {
    match visitor.visit_aug_assign(node) {
        VisitResult::Stop => VisitResult::Stop,
        VisitResult::SkipChildren => VisitResult::Continue,
        VisitResult::Continue => {
            walk_child!(walk_expression(visitor, &node.target));
            walk_expression(visitor, &node.value)
        }
    }
}

// ============================================================================
// Expression walks
// ============================================================================

/// Walk an [`Expression`] node and all of its subexpressions.
pub fn walk_expression<'a, V: Visitor<'a>>(visitor: &mut V, node: &Expression<'a>) -> VisitResult {
    match visitor.visit_expression(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            walk_child!(walk_expression_children(visitor, node));
        }
    }
    visitor.leave_expression(node);
    VisitResult::Continue
}

fn walk_all<'a, V: Visitor<'a>>(visitor: &mut V, exprs: &[Expression<'a>]) -> VisitResult {
    for expr in exprs {
        walk_child!(walk_expression(visitor, expr));
    }
    VisitResult::Continue
}

fn walk_optional<'a, V: Visitor<'a>>(
    visitor: &mut V,
    expr: Option<&Expression<'a>>,
) -> VisitResult {
    match expr {
        Some(expr) => walk_expression(visitor, expr),
        None => VisitResult::Continue,
    }
}

fn walk_expression_children<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &Expression<'a>,
) -> VisitResult {
    match node {
        Expression::Name(n) => match visitor.visit_name(n) {
            VisitResult::Stop => VisitResult::Stop,
            _ => VisitResult::Continue,
        },
        Expression::Attribute(a) => walk_attribute(visitor, a),
        Expression::Call(c) => walk_call(visitor, c),
        Expression::Subscript(s) => {
            walk_child!(walk_expression(visitor, &s.value));
            walk_all(visitor, &s.slice)
        }
        Expression::Tuple(t) => walk_all(visitor, &t.elements),
        Expression::List(l) => walk_all(visitor, &l.elements),
        Expression::Set(s) => walk_all(visitor, &s.elements),
        Expression::Dict(d) => {
            for item in &d.items {
                match item {
                    DictItem::Pair(k, v) => {
                        walk_child!(walk_expression(visitor, k));
                        walk_child!(walk_expression(visitor, v));
                    }
                    DictItem::Unpack(e) => walk_child!(walk_expression(visitor, e)),
                }
            }
            VisitResult::Continue
        }
        Expression::Starred(s) => walk_expression(visitor, &s.value),
        Expression::Strings(_) | Expression::Number(_) | Expression::Constant(_) => {
            VisitResult::Continue
        }
        Expression::BinaryOp(b) => {
            walk_child!(walk_expression(visitor, &b.left));
            walk_expression(visitor, &b.right)
        }
        Expression::UnaryOp(u) => walk_expression(visitor, &u.operand),
        Expression::BoolOp(b) => walk_all(visitor, &b.values),
        Expression::Compare(c) => {
            walk_child!(walk_expression(visitor, &c.left));
            for (_, comparator) in &c.comparisons {
                walk_child!(walk_expression(visitor, comparator));
            }
            VisitResult::Continue
        }
        Expression::IfExp(i) => {
            walk_child!(walk_expression(visitor, &i.body));
            walk_child!(walk_expression(visitor, &i.test));
            walk_expression(visitor, &i.orelse)
        }
        Expression::Lambda(l) => {
            walk_child!(walk_parameters(visitor, &l.params));
            walk_expression(visitor, &l.body)
        }
        Expression::NamedExpr(n) => {
            if visitor.visit_name(&n.target) == VisitResult::Stop {
                return VisitResult::Stop;
            }
            walk_expression(visitor, &n.value)
        }
        Expression::Await(e) | Expression::YieldFrom(e) => walk_expression(visitor, e),
        Expression::Yield(e) => walk_optional(visitor, e.as_deref()),
        Expression::Comprehension(c) => {
            walk_child!(walk_expression(visitor, &c.element));
            walk_child!(walk_optional(visitor, c.value.as_deref()));
            for generator in &c.generators {
                walk_child!(walk_expression(visitor, &generator.target));
                walk_child!(walk_expression(visitor, &generator.iter));
                walk_child!(walk_all(visitor, &generator.ifs));
            }
            VisitResult::Continue
        }
        Expression::Slice(s) => {
            walk_child!(walk_optional(visitor, s.lower.as_deref()));
            walk_child!(walk_optional(visitor, s.upper.as_deref()));
            walk_optional(visitor, s.step.as_deref())
        }
    }
}

pub fn walk_attribute<'a, V: Visitor<'a>>(visitor: &mut V, node: &Attribute<'a>) -> VisitResult {
    match visitor.visit_attribute(node) {
        VisitResult::Stop => VisitResult::Stop,
        VisitResult::SkipChildren => VisitResult::Continue,
        VisitResult::Continue => walk_expression(visitor, &node.value),
    }
}

pub fn walk_call<'a, V: Visitor<'a>>(visitor: &mut V, node: &Call<'a>) -> VisitResult {
    match visitor.visit_call(node) {
        VisitResult::Stop => VisitResult::Stop,
        VisitResult::SkipChildren => VisitResult::Continue,
        VisitResult::Continue => {
            walk_child!(walk_expression(visitor, &node.func));
            for arg in &node.args {
                walk_child!(walk_arg(visitor, arg));
            }
            VisitResult::Continue
        }
    }
}

pub fn walk_arg<'a, V: Visitor<'a>>(visitor: &mut V, node: &Arg<'a>) -> VisitResult {
    match visitor.visit_arg(node) {
        VisitResult::Stop => VisitResult::Stop,
        VisitResult::SkipChildren => VisitResult::Continue,
        VisitResult::Continue => walk_expression(visitor, &node.value),
    }
}
