// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Syntax tree node types.

pub mod expression;
pub mod statement;

pub use expression::{
    Arg, Attribute, BinaryOp, BoolOp, Call, CompFor, CompOp, Compare, Comprehension,
    ComprehensionKind, Constant, Dict, DictItem, Expression, IfExp, Lambda, List, Name,
    NamedExpr, Number, Param, ParamKind, Parameters, Set, Slice, Starred, StringPart, Strings,
    Subscript, Tuple, UnaryOp,
};
pub use statement::{
    AnnAssign, Assign, AugAssign, ClassDef, Decorator, DefId, ExceptHandler, ExprStmt, For,
    FunctionDef, If, Import, ImportAlias, ImportFrom, Match, MatchCase, Module, OtherStmt, Return,
    Statement, Try, While, With, WithItem,
};
