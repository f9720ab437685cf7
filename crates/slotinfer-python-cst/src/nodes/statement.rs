// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Statement nodes.
//!
//! Every statement records the line it starts on. Function and class
//! definitions also record the column of their keyword, which together with
//! the line identifies the definition within a module (see [`DefId`]).

use serde::Serialize;

use super::expression::{Arg, Expression, Name, Parameters};

/// A parsed source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Module<'a> {
    pub body: Vec<Statement<'a>>,
}

/// Identity of a function or class definition within one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefId {
    pub line: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Statement<'a> {
    FunctionDef(FunctionDef<'a>),
    ClassDef(ClassDef<'a>),
    Assign(Assign<'a>),
    AnnAssign(AnnAssign<'a>),
    AugAssign(AugAssign<'a>),
    Expr(ExprStmt<'a>),
    Return(Return<'a>),
    If(If<'a>),
    While(While<'a>),
    For(For<'a>),
    With(With<'a>),
    Try(Try<'a>),
    Match(Match<'a>),
    Import(Import<'a>),
    ImportFrom(ImportFrom<'a>),
    /// `pass`, `break`, `continue`, `del`, `raise`, `assert`, `global`,
    /// `nonlocal` and `type` aliases: the keyword and its operands.
    Other(OtherStmt<'a>),
}

impl<'a> Statement<'a> {
    /// Line the statement starts on.
    pub fn line(&self) -> u32 {
        match self {
            Statement::FunctionDef(s) => s.first_line(),
            Statement::ClassDef(s) => s.first_line(),
            Statement::Assign(s) => s.line,
            Statement::AnnAssign(s) => s.line,
            Statement::AugAssign(s) => s.line,
            Statement::Expr(s) => s.line,
            Statement::Return(s) => s.line,
            Statement::If(s) => s.line,
            Statement::While(s) => s.line,
            Statement::For(s) => s.line,
            Statement::With(s) => s.line,
            Statement::Try(s) => s.line,
            Statement::Match(s) => s.line,
            Statement::Import(s) => s.line,
            Statement::ImportFrom(s) => s.line,
            Statement::Other(s) => s.line,
        }
    }
}

/// `@expr` on its own line(s) before a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decorator<'a> {
    pub expr: Expression<'a>,
    /// Line of the `@`.
    pub line: u32,
    /// Last line of the decorator expression.
    pub end_line: u32,
}

impl<'a> Decorator<'a> {
    /// The decorator as a dotted name (`slots`, `slot.s`), if it is one.
    pub fn dotted_name(&self) -> Option<String> {
        dotted_name(&self.expr)
    }
}

fn dotted_name(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::Name(n) => Some(n.value.to_string()),
        Expression::Attribute(a) => {
            let mut base = dotted_name(&a.value)?;
            base.push('.');
            base.push_str(a.attr.value);
            Some(base)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDef<'a> {
    pub name: Name<'a>,
    pub decorators: Vec<Decorator<'a>>,
    pub params: Parameters<'a>,
    pub returns: Option<Expression<'a>>,
    pub body: Vec<Statement<'a>>,
    pub is_async: bool,
    /// Line of the `def` (or `async`) keyword.
    pub line: u32,
    pub col: u32,
}

impl<'a> FunctionDef<'a> {
    pub fn id(&self) -> DefId {
        DefId {
            line: self.line,
            col: self.col,
        }
    }

    /// First line of the definition, decorators included.
    pub fn first_line(&self) -> u32 {
        self.decorators.first().map_or(self.line, |d| d.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDef<'a> {
    pub name: Name<'a>,
    pub decorators: Vec<Decorator<'a>>,
    /// Positional arguments of the class statement.
    pub bases: Vec<Expression<'a>>,
    /// Keyword arguments (`metaclass=...`) and `**` unpacking.
    pub keywords: Vec<Arg<'a>>,
    pub body: Vec<Statement<'a>>,
    /// Line of the `class` keyword.
    pub line: u32,
    pub col: u32,
}

impl<'a> ClassDef<'a> {
    pub fn id(&self) -> DefId {
        DefId {
            line: self.line,
            col: self.col,
        }
    }

    pub fn first_line(&self) -> u32 {
        self.decorators.first().map_or(self.line, |d| d.line)
    }
}

/// `t1 = t2 = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assign<'a> {
    pub targets: Vec<Expression<'a>>,
    pub value: Expression<'a>,
    pub line: u32,
}

/// `target: annotation [= value]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnAssign<'a> {
    pub target: Expression<'a>,
    pub annotation: Expression<'a>,
    pub value: Option<Expression<'a>>,
    pub line: u32,
}

/// `target op= value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AugAssign<'a> {
    pub target: Expression<'a>,
    pub op: &'a str,
    pub value: Expression<'a>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExprStmt<'a> {
    pub value: Expression<'a>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Return<'a> {
    pub value: Option<Expression<'a>>,
    pub line: u32,
}

/// `if`/`elif`/`else`; an `elif` chain nests in `orelse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct If<'a> {
    pub test: Expression<'a>,
    pub body: Vec<Statement<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct While<'a> {
    pub test: Expression<'a>,
    pub body: Vec<Statement<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct For<'a> {
    pub target: Expression<'a>,
    pub iter: Expression<'a>,
    pub body: Vec<Statement<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub is_async: bool,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithItem<'a> {
    pub context: Expression<'a>,
    pub target: Option<Expression<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct With<'a> {
    pub items: Vec<WithItem<'a>>,
    pub body: Vec<Statement<'a>>,
    pub is_async: bool,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptHandler<'a> {
    pub kind: Option<Expression<'a>>,
    pub name: Option<Name<'a>>,
    pub body: Vec<Statement<'a>>,
    /// `except*`
    pub is_star: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Try<'a> {
    pub body: Vec<Statement<'a>>,
    pub handlers: Vec<ExceptHandler<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub finalbody: Vec<Statement<'a>>,
    pub line: u32,
}

/// One `case` arm. Patterns are not modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCase<'a> {
    pub guard: Option<Expression<'a>>,
    pub body: Vec<Statement<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match<'a> {
    pub subject: Expression<'a>,
    pub cases: Vec<MatchCase<'a>>,
    pub line: u32,
}

/// `a.b.c as d` in an import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportAlias<'a> {
    pub name: Vec<Name<'a>>,
    pub asname: Option<Name<'a>>,
}

impl<'a> ImportAlias<'a> {
    /// The name this alias binds in the importing namespace.
    ///
    /// `import a.b` binds `a`; `import a.b as c` binds `c`.
    pub fn bound_name(&self) -> Option<&'a str> {
        match &self.asname {
            Some(n) => Some(n.value),
            None => self.name.first().map(|n| n.value),
        }
    }
}

/// `import a, b.c as d`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import<'a> {
    pub names: Vec<ImportAlias<'a>>,
    pub line: u32,
}

/// `from ..module import a, b as c` / `from m import *`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFrom<'a> {
    pub module: Vec<Name<'a>>,
    /// Number of leading dots.
    pub level: u32,
    pub names: Vec<ImportAlias<'a>>,
    pub star: bool,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherStmt<'a> {
    pub keyword: &'a str,
    pub exprs: Vec<Expression<'a>>,
    pub line: u32,
}
