// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Expression nodes.
//!
//! Nodes borrow identifiers and literal text from the source. Positions are
//! kept only where analysis reports them: names, calls and string parts.

use serde::Serialize;

/// An identifier occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Name<'a> {
    pub value: &'a str,
    /// Line of the identifier (1-indexed).
    pub line: u32,
    /// Column of the identifier (1-indexed, in characters).
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Expression<'a> {
    Name(Name<'a>),
    Attribute(Attribute<'a>),
    Call(Call<'a>),
    Subscript(Subscript<'a>),
    Tuple(Tuple<'a>),
    List(List<'a>),
    Set(Set<'a>),
    Dict(Dict<'a>),
    Starred(Starred<'a>),
    Strings(Strings<'a>),
    Number(Number<'a>),
    Constant(Constant),
    BinaryOp(BinaryOp<'a>),
    UnaryOp(UnaryOp<'a>),
    BoolOp(BoolOp<'a>),
    Compare(Compare<'a>),
    IfExp(IfExp<'a>),
    Lambda(Lambda<'a>),
    NamedExpr(NamedExpr<'a>),
    Await(Box<Expression<'a>>),
    Yield(Option<Box<Expression<'a>>>),
    YieldFrom(Box<Expression<'a>>),
    Comprehension(Comprehension<'a>),
    Slice(Slice<'a>),
}

impl<'a> Expression<'a> {
    /// The identifier if this is a plain name.
    pub fn as_name(&self) -> Option<&Name<'a>> {
        match self {
            Expression::Name(n) => Some(n),
            _ => None,
        }
    }
}

/// `value.attr`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute<'a> {
    pub value: Box<Expression<'a>>,
    pub attr: Name<'a>,
}

/// `func(args)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call<'a> {
    pub func: Box<Expression<'a>>,
    pub args: Vec<Arg<'a>>,
    /// Line of the opening parenthesis.
    pub line: u32,
}

/// One call argument, class base or class keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arg<'a> {
    pub value: Expression<'a>,
    /// Keyword name for `name=value`.
    pub keyword: Option<Name<'a>>,
    /// `"*"` or `"**"` for unpacked arguments.
    pub star: Option<&'a str>,
}

impl<'a> Arg<'a> {
    pub fn positional(value: Expression<'a>) -> Self {
        Arg {
            value,
            keyword: None,
            star: None,
        }
    }

    /// Keyword arguments and `**mapping` unpacking.
    pub fn is_keyword(&self) -> bool {
        self.keyword.is_some() || self.star == Some("**")
    }
}

/// `value[slice]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscript<'a> {
    pub value: Box<Expression<'a>>,
    pub slice: Vec<Expression<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tuple<'a> {
    pub elements: Vec<Expression<'a>>,
    pub parenthesized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct List<'a> {
    pub elements: Vec<Expression<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Set<'a> {
    pub elements: Vec<Expression<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dict<'a> {
    pub items: Vec<DictItem<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DictItem<'a> {
    Pair(Expression<'a>, Expression<'a>),
    /// `**mapping`
    Unpack(Expression<'a>),
}

/// `*value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Starred<'a> {
    pub value: Box<Expression<'a>>,
}

/// One or more adjacent string literals (implicit concatenation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strings<'a> {
    pub parts: Vec<StringPart<'a>>,
}

/// A single string literal token, prefix and quotes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StringPart<'a> {
    pub raw: &'a str,
    pub line: u32,
    pub col: u32,
}

impl<'a> Strings<'a> {
    /// The value of the literal if it is a plain (non-bytes, non-formatted)
    /// string whose escapes can be decoded.
    pub fn value(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            out.push_str(&part.value()?);
        }
        Some(out)
    }
}

impl<'a> StringPart<'a> {
    /// Decoded value of this literal, `None` for bytes, f-strings, t-strings
    /// and escapes other than the common single-character ones.
    pub fn value(&self) -> Option<String> {
        let quote_start = self.raw.find(['\'', '"'])?;
        let prefix = self.raw[..quote_start].to_ascii_lowercase();
        if prefix.contains(['b', 'f', 't']) {
            return None;
        }
        let raw_mode = prefix.contains('r');
        let body = &self.raw[quote_start..];
        let quote_len = if body.starts_with("\"\"\"") || body.starts_with("'''") {
            3
        } else {
            1
        };
        if body.len() < 2 * quote_len {
            return None;
        }
        let inner = &body[quote_len..body.len() - quote_len];
        if raw_mode {
            return Some(inner.to_string());
        }

        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next()? {
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\n' => {}
                _ => return None,
            }
        }
        Some(out)
    }
}

/// A numeric literal, kept as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Number<'a> {
    pub raw: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Constant {
    None,
    True,
    False,
    Ellipsis,
}

/// `left op right` for arithmetic and bitwise operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryOp<'a> {
    pub left: Box<Expression<'a>>,
    pub op: &'a str,
    pub right: Box<Expression<'a>>,
}

/// `-x`, `+x`, `~x`, `not x`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnaryOp<'a> {
    pub op: &'a str,
    pub operand: Box<Expression<'a>>,
}

/// `a or b or c` / `a and b`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoolOp<'a> {
    pub op: &'a str,
    pub values: Vec<Expression<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

/// `left op1 c1 op2 c2 ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compare<'a> {
    pub left: Box<Expression<'a>>,
    pub comparisons: Vec<(CompOp, Expression<'a>)>,
}

/// `body if test else orelse`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IfExp<'a> {
    pub test: Box<Expression<'a>>,
    pub body: Box<Expression<'a>>,
    pub orelse: Box<Expression<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lambda<'a> {
    pub params: Parameters<'a>,
    pub body: Box<Expression<'a>>,
}

/// `target := value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedExpr<'a> {
    pub target: Name<'a>,
    pub value: Box<Expression<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComprehensionKind {
    List,
    Set,
    Dict,
    Generator,
}

/// List, set, dict comprehensions and generator expressions.
///
/// For dict comprehensions `element` is the key and `value` the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comprehension<'a> {
    pub kind: ComprehensionKind,
    pub element: Box<Expression<'a>>,
    pub value: Option<Box<Expression<'a>>>,
    pub generators: Vec<CompFor<'a>>,
}

/// `[async] for target in iter if cond...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompFor<'a> {
    pub target: Expression<'a>,
    pub iter: Expression<'a>,
    pub ifs: Vec<Expression<'a>>,
    pub is_async: bool,
}

/// `lower:upper:step` inside a subscript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice<'a> {
    pub lower: Option<Box<Expression<'a>>>,
    pub upper: Option<Box<Expression<'a>>>,
    pub step: Option<Box<Expression<'a>>>,
}

/// Function or lambda parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameters<'a> {
    pub params: Vec<Param<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamKind {
    /// Ordinary parameter.
    Normal,
    /// `*args`
    VarPositional,
    /// `**kwargs`
    VarKeyword,
    /// Bare `*` separator.
    KeywordOnlyMarker,
    /// `/` separator.
    PositionalOnlyMarker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param<'a> {
    pub kind: ParamKind,
    /// Absent for the `*` and `/` separators.
    pub name: Option<Name<'a>>,
    pub annotation: Option<Expression<'a>>,
    pub default: Option<Expression<'a>>,
}
