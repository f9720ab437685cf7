// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! PEG grammar over the token stream.
//!
//! The grammar follows the shape of the CPython PEG grammar but builds a
//! plain syntax tree. Alternatives that would re-parse the same prefix are
//! written as one parse followed by an optional tail, so that parsing stays
//! linear in nesting depth. `match` patterns and type parameter lists are
//! consumed as balanced token runs and not modelled.

use std::fmt;

use peg::{Parse, ParseElem, RuleResult};

use crate::nodes::{
    Arg, Attribute, BinaryOp, BoolOp, Call, ClassDef, CompFor, CompOp, Compare, Comprehension,
    ComprehensionKind, Decorator, Dict, DictItem, Expression, List, Name, Param, Parameters, Set,
    Starred, Statement, StringPart, Strings, Subscript, Tuple, UnaryOp,
};
use crate::nodes::{
    AnnAssign, Assign, AugAssign, ExceptHandler, ExprStmt, FunctionDef, If, ImportAlias, Module,
    OtherStmt, Return, WithItem,
};
use crate::tokenizer::{TokType, Token};

/// Hard keywords; these never parse as names.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const AUG_OPS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "@=", "&=", "|=", "^=", ">>=", "<<=", "**=",
];

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Token sequence the grammar runs over.
#[derive(Debug)]
pub struct TokVec<'a>(pub Vec<Token<'a>>);

impl<'a> From<Vec<Token<'a>>> for TokVec<'a> {
    fn from(vec: Vec<Token<'a>>) -> Self {
        TokVec(vec)
    }
}

/// Location of a parse failure, reported as the token there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLoc {
    pub line: u32,
    pub col: u32,
    /// Byte range of the offending token.
    pub offset: usize,
    pub end_offset: usize,
    /// Text of the offending token (empty at end of input).
    pub token: String,
}

impl fmt::Display for ParseLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl<'a> Parse for TokVec<'a> {
    type PositionRepr = ParseLoc;

    fn start(&self) -> usize {
        0
    }

    fn is_eof(&self, pos: usize) -> bool {
        pos >= self.0.len()
    }

    fn position_repr(&self, pos: usize) -> Self::PositionRepr {
        match self.0.get(pos).or_else(|| self.0.last()) {
            Some(tok) => ParseLoc {
                line: tok.start_pos.line,
                col: tok.start_pos.col,
                offset: tok.start_pos.offset,
                end_offset: tok.end_pos.offset,
                token: tok.string.to_string(),
            },
            None => ParseLoc {
                line: 1,
                col: 1,
                offset: 0,
                end_offset: 0,
                token: String::new(),
            },
        }
    }
}

type TokenRef<'input, 'a> = &'input Token<'a>;

impl<'input, 'a: 'input> ParseElem<'input> for TokVec<'a> {
    type Element = TokenRef<'input, 'a>;

    fn parse_elem(&'input self, pos: usize) -> RuleResult<Self::Element> {
        match self.0.get(pos) {
            Some(tok) => RuleResult::Matched(pos + 1, tok),
            None => RuleResult::Failed,
        }
    }
}

peg::parser! {
    pub grammar python<'a>(lines: &[u32]) for TokVec<'a> {

        // ====================================================================
        // Module and statements
        // ====================================================================

        pub rule file() -> Module<'a>
            = body:statement()* tok(TokType::EndMarker, "EOF") {
                Module { body: body.into_iter().flatten().collect() }
            }

        rule statement() -> Vec<Statement<'a>>
            = c:compound_stmt() { vec![c] }
            / simple_stmts()

        rule simple_stmts() -> Vec<Statement<'a>>
            = s:(simple_stmt() ++ lit(";")) lit(";")? tok(TokType::Newline, "NEWLINE") { s }

        rule block() -> Vec<Statement<'a>>
            = tok(TokType::Newline, "NEWLINE") tok(TokType::Indent, "INDENT")
              b:statement()+ tok(TokType::Dedent, "DEDENT") {
                b.into_iter().flatten().collect()
            }
            / simple_stmts()

        rule compound_stmt() -> Statement<'a>
            = d:decorator()* s:(function_def() / class_def()) { with_decorators(s, d) }
            / if_stmt()
            / while_stmt()
            / for_stmt()
            / with_stmt()
            / try_stmt()
            / match_stmt()

        rule decorator() -> Decorator<'a>
            = at:lit("@") e:named_expression() nl:tok(TokType::Newline, "NEWLINE") {
                Decorator { expr: e, line: at.start_pos.line, end_line: nl.start_pos.line }
            }

        rule function_def() -> Statement<'a>
            = a:lit("async")? d:lit("def") n:name() type_params()? lit("(") p:parameters() lit(")")
              r:(lit("->") e:expression() { e })? lit(":") b:block() {
                let first = a.unwrap_or(d);
                Statement::FunctionDef(FunctionDef {
                    name: n,
                    decorators: Vec::new(),
                    params: p,
                    returns: r,
                    body: b,
                    is_async: a.is_some(),
                    line: first.start_pos.line,
                    col: first.start_pos.col,
                })
            }

        rule class_def() -> Statement<'a>
            = c:lit("class") n:name() type_params()?
              a:(lit("(") args:arguments()? lit(")") { args.unwrap_or_default() })? lit(":") b:block() {
                let (bases, keywords): (Vec<Arg<'a>>, Vec<Arg<'a>>) =
                    a.unwrap_or_default().into_iter().partition(|arg| !arg.is_keyword());
                Statement::ClassDef(ClassDef {
                    name: n,
                    decorators: Vec::new(),
                    bases: bases.into_iter().map(class_base).collect(),
                    keywords,
                    body: b,
                    line: c.start_pos.line,
                    col: c.start_pos.col,
                })
            }

        rule type_params() = lit("[") balanced()* lit("]")

        rule balanced()
            = lit("(") balanced()* lit(")")
            / lit("[") balanced()* lit("]")
            / lit("{") balanced()* lit("}")
            / !closer() [_]

        rule closer() = lit(")") / lit("]") / lit("}")

        rule if_stmt() -> Statement<'a>
            = i:lit("if") t:named_expression() lit(":") b:block() o:elif_or_else()? {
                Statement::If(If { test: t, body: b, orelse: o.unwrap_or_default(), line: i.start_pos.line })
            }

        rule elif_or_else() -> Vec<Statement<'a>>
            = i:lit("elif") t:named_expression() lit(":") b:block() o:elif_or_else()? {
                vec![Statement::If(If { test: t, body: b, orelse: o.unwrap_or_default(), line: i.start_pos.line })]
            }
            / else_block()

        rule else_block() -> Vec<Statement<'a>>
            = lit("else") lit(":") b:block() { b }

        rule while_stmt() -> Statement<'a>
            = w:lit("while") t:named_expression() lit(":") b:block() o:else_block()? {
                Statement::While(crate::nodes::While { test: t, body: b, orelse: o.unwrap_or_default(), line: w.start_pos.line })
            }

        rule for_stmt() -> Statement<'a>
            = a:lit("async")? f:lit("for") t:star_targets() lit("in") i:star_expressions() lit(":")
              b:block() o:else_block()? {
                let first = a.unwrap_or(f);
                Statement::For(crate::nodes::For {
                    target: t,
                    iter: i,
                    body: b,
                    orelse: o.unwrap_or_default(),
                    is_async: a.is_some(),
                    line: first.start_pos.line,
                })
            }

        rule with_stmt() -> Statement<'a>
            = a:lit("async")? w:lit("with") lit("(") items:(with_item() ++ lit(",")) lit(",")? lit(")")
              lit(":") b:block() {
                let first = a.unwrap_or(w);
                Statement::With(crate::nodes::With { items, body: b, is_async: a.is_some(), line: first.start_pos.line })
            }
            / a:lit("async")? w:lit("with") items:(with_item() ++ lit(",")) lit(":") b:block() {
                let first = a.unwrap_or(w);
                Statement::With(crate::nodes::With { items, body: b, is_async: a.is_some(), line: first.start_pos.line })
            }

        rule with_item() -> WithItem<'a>
            = e:expression() t:(lit("as") t:star_target() { t })? { WithItem { context: e, target: t } }

        rule try_stmt() -> Statement<'a>
            = t:lit("try") lit(":") b:block() h:except_block()+ o:else_block()? f:finally_block()? {
                Statement::Try(crate::nodes::Try {
                    body: b,
                    handlers: h,
                    orelse: o.unwrap_or_default(),
                    finalbody: f.unwrap_or_default(),
                    line: t.start_pos.line,
                })
            }
            / t:lit("try") lit(":") b:block() f:finally_block() {
                Statement::Try(crate::nodes::Try {
                    body: b,
                    handlers: Vec::new(),
                    orelse: Vec::new(),
                    finalbody: f,
                    line: t.start_pos.line,
                })
            }

        rule except_block() -> ExceptHandler<'a>
            = lit("except") s:lit("*")? k:(x:expressions() n:(lit("as") n:name() { n })? { (x, n) })?
              lit(":") b:block() {
                let (kind, name) = match k {
                    Some((x, n)) => (Some(x), n),
                    None => (None, None),
                };
                ExceptHandler { kind, name, body: b, is_star: s.is_some() }
            }

        rule finally_block() -> Vec<Statement<'a>>
            = lit("finally") lit(":") b:block() { b }

        rule match_stmt() -> Statement<'a>
            = m:lit("match") s:star_named_expressions() lit(":") tok(TokType::Newline, "NEWLINE")
              tok(TokType::Indent, "INDENT") c:case_block()+ tok(TokType::Dedent, "DEDENT") {
                Statement::Match(crate::nodes::Match { subject: s, cases: c, line: m.start_pos.line })
            }

        rule case_block() -> crate::nodes::MatchCase<'a>
            = lit("case") pattern_part()+ g:(lit("if") e:named_expression() { e })? lit(":") b:block() {
                crate::nodes::MatchCase { guard: g, body: b }
            }

        rule pattern_part()
            = lit("(") balanced()* lit(")")
            / lit("[") balanced()* lit("]")
            / lit("{") balanced()* lit("}")
            / !(lit(":") / lit("if") / closer() / tok(TokType::Newline, "NEWLINE")) [_]

        // ====================================================================
        // Simple statements
        // ====================================================================

        rule simple_stmt() -> Statement<'a>
            = r:lit("return") v:star_expressions()? {
                Statement::Return(Return { value: v, line: r.start_pos.line })
            }
            / import_stmt()
            / k:(lit("pass") / lit("break") / lit("continue")) {
                other_stmt(k, Vec::new())
            }
            / k:lit("del") t:star_targets() { other_stmt(k, vec![t]) }
            / k:lit("raise") e:(x:expression() c:(lit("from") c:expression() { c })? {
                let mut v = vec![x];
                v.extend(c);
                v
              })? { other_stmt(k, e.unwrap_or_default()) }
            / k:lit("assert") t:expression() m:(lit(",") m:expression() { m })? {
                let mut v = vec![t];
                v.extend(m);
                other_stmt(k, v)
            }
            / k:(lit("global") / lit("nonlocal")) n:(name() ++ lit(",")) {
                other_stmt(k, n.into_iter().map(Expression::Name).collect())
            }
            / k:lit("type") n:name() type_params()? lit("=") e:expression() {
                other_stmt(k, vec![Expression::Name(n), e])
            }
            / l:line() y:yield_expr() { Statement::Expr(ExprStmt { value: y, line: l }) }
            / expr_stmt()

        rule expr_stmt() -> Statement<'a>
            = l:line() first:star_expressions() tail:expr_tail() { build_expr_stmt(first, tail, l) }

        rule expr_tail() -> ExprTail<'a>
            = lit(":") a:expression() v:(lit("=") v:assign_rhs() { v })? { ExprTail::Annotated(a, v) }
            / op:augassign() v:assign_rhs() { ExprTail::Aug(op.string, v) }
            / v:(lit("=") v:assign_rhs() { v })+ { ExprTail::Assign(v) }
            / { ExprTail::Bare }

        rule assign_rhs() -> Expression<'a>
            = yield_expr()
            / star_expressions()

        rule augassign() -> TokenRef<'input, 'a>
            = [t] {? if t.r#type == TokType::Op && AUG_OPS.contains(&t.string) { Ok(t) } else { Err("augmented assignment") } }

        rule import_stmt() -> Statement<'a>
            = i:lit("import") n:(dotted_as_name() ++ lit(",")) {
                Statement::Import(crate::nodes::Import { names: n, line: i.start_pos.line })
            }
            / f:lit("from") l:import_dots() m:dotted_name()? lit("import") t:import_targets() {
                let (names, star) = t;
                Statement::ImportFrom(crate::nodes::ImportFrom {
                    module: m.unwrap_or_default(),
                    level: l,
                    names,
                    star,
                    line: f.start_pos.line,
                })
            }

        rule import_dots() -> u32
            = d:(lit(".") { 1u32 } / lit("...") { 3u32 })* { d.iter().sum() }

        rule dotted_name() -> Vec<Name<'a>>
            = n:(name() ++ lit(".")) { n }

        rule dotted_as_name() -> ImportAlias<'a>
            = n:dotted_name() a:(lit("as") a:name() { a })? { ImportAlias { name: n, asname: a } }

        rule import_targets() -> (Vec<ImportAlias<'a>>, bool)
            = lit("(") n:(import_as_name() ++ lit(",")) lit(",")? lit(")") { (n, false) }
            / lit("*") { (Vec::new(), true) }
            / n:(import_as_name() ++ lit(",")) { (n, false) }

        rule import_as_name() -> ImportAlias<'a>
            = n:name() a:(lit("as") a:name() { a })? { ImportAlias { name: vec![n], asname: a } }

        // ====================================================================
        // Parameters
        // ====================================================================

        rule parameters() -> Parameters<'a>
            = p:(param() ** lit(",")) lit(",")? { Parameters { params: p } }

        rule param() -> Param<'a>
            = lit("**") n:name() a:(lit(":") e:expression() { e })? {
                make_param(crate::nodes::ParamKind::VarKeyword, Some(n), a, None)
            }
            / lit("*") n:name() a:(lit(":") e:star_expression() { e })? {
                make_param(crate::nodes::ParamKind::VarPositional, Some(n), a, None)
            }
            / lit("*") { make_param(crate::nodes::ParamKind::KeywordOnlyMarker, None, None, None) }
            / lit("/") { make_param(crate::nodes::ParamKind::PositionalOnlyMarker, None, None, None) }
            / n:name() a:(lit(":") e:expression() { e })? d:(lit("=") e:expression() { e })? {
                make_param(crate::nodes::ParamKind::Normal, Some(n), a, d)
            }

        rule lambda_parameters() -> Parameters<'a>
            = p:(lambda_param() ** lit(",")) lit(",")? { Parameters { params: p } }

        rule lambda_param() -> Param<'a>
            = lit("**") n:name() { make_param(crate::nodes::ParamKind::VarKeyword, Some(n), None, None) }
            / lit("*") n:name() { make_param(crate::nodes::ParamKind::VarPositional, Some(n), None, None) }
            / lit("*") { make_param(crate::nodes::ParamKind::KeywordOnlyMarker, None, None, None) }
            / lit("/") { make_param(crate::nodes::ParamKind::PositionalOnlyMarker, None, None, None) }
            / n:name() d:(lit("=") e:expression() { e })? {
                make_param(crate::nodes::ParamKind::Normal, Some(n), None, d)
            }

        // ====================================================================
        // Targets
        // ====================================================================

        rule star_targets() -> Expression<'a>
            = first:star_target() rest:(lit(",") t:star_target() { t })* trailing:lit(",")? {
                sequence(first, rest, trailing.is_some(), false)
            }

        rule star_target() -> Expression<'a>
            = lit("*") t:star_target() { Expression::Starred(Starred { value: Box::new(t) }) }
            / primary()

        // ====================================================================
        // Expressions
        // ====================================================================

        rule expressions() -> Expression<'a>
            = first:expression() rest:(lit(",") e:expression() { e })* trailing:lit(",")? {
                sequence(first, rest, trailing.is_some(), false)
            }

        rule star_expressions() -> Expression<'a>
            = first:star_expression() rest:(lit(",") e:star_expression() { e })* trailing:lit(",")? {
                sequence(first, rest, trailing.is_some(), false)
            }

        rule star_expression() -> Expression<'a>
            = lit("*") e:bitwise_or() { Expression::Starred(Starred { value: Box::new(e) }) }
            / expression()

        rule star_named_expressions() -> Expression<'a>
            = first:star_named_expression() rest:(lit(",") e:star_named_expression() { e })*
              trailing:lit(",")? {
                sequence(first, rest, trailing.is_some(), false)
            }

        rule star_named_expression() -> Expression<'a>
            = lit("*") e:bitwise_or() { Expression::Starred(Starred { value: Box::new(e) }) }
            / named_expression()

        rule named_expression() -> Expression<'a>
            = n:name() lit(":=") e:expression() {
                Expression::NamedExpr(crate::nodes::NamedExpr { target: n, value: Box::new(e) })
            }
            / expression()

        rule expression() -> Expression<'a>
            = lambdef()
            / d:disjunction() c:(lit("if") t:disjunction() lit("else") e:expression() { (t, e) })? {
                match c {
                    Some((t, e)) => Expression::IfExp(crate::nodes::IfExp {
                        test: Box::new(t),
                        body: Box::new(d),
                        orelse: Box::new(e),
                    }),
                    None => d,
                }
            }

        rule lambdef() -> Expression<'a>
            = lit("lambda") p:lambda_parameters() lit(":") b:expression() {
                Expression::Lambda(crate::nodes::Lambda { params: p, body: Box::new(b) })
            }

        rule yield_expr() -> Expression<'a>
            = lit("yield") lit("from") e:expression() { Expression::YieldFrom(Box::new(e)) }
            / lit("yield") e:star_expressions()? { Expression::Yield(e.map(Box::new)) }

        rule disjunction() -> Expression<'a>
            = first:conjunction() rest:(lit("or") c:conjunction() { c })* { bool_op("or", first, rest) }

        rule conjunction() -> Expression<'a>
            = first:inversion() rest:(lit("and") c:inversion() { c })* { bool_op("and", first, rest) }

        rule inversion() -> Expression<'a>
            = lit("not") i:inversion() {
                Expression::UnaryOp(UnaryOp { op: "not", operand: Box::new(i) })
            }
            / comparison()

        rule comparison() -> Expression<'a>
            = first:bitwise_or() rest:(op:comp_op() e:bitwise_or() { (op, e) })* {
                if rest.is_empty() {
                    first
                } else {
                    Expression::Compare(Compare { left: Box::new(first), comparisons: rest })
                }
            }

        rule comp_op() -> CompOp
            = lit("==") { CompOp::Eq }
            / lit("!=") { CompOp::NotEq }
            / lit("<=") { CompOp::LtE }
            / lit(">=") { CompOp::GtE }
            / lit("<") { CompOp::Lt }
            / lit(">") { CompOp::Gt }
            / lit("not") lit("in") { CompOp::NotIn }
            / lit("in") { CompOp::In }
            / lit("is") lit("not") { CompOp::IsNot }
            / lit("is") { CompOp::Is }

        rule bitwise_or() -> Expression<'a>
            = first:bitwise_xor() rest:(op:lit("|") e:bitwise_xor() { (op, e) })* { fold_binary(first, rest) }

        rule bitwise_xor() -> Expression<'a>
            = first:bitwise_and() rest:(op:lit("^") e:bitwise_and() { (op, e) })* { fold_binary(first, rest) }

        rule bitwise_and() -> Expression<'a>
            = first:shift_expr() rest:(op:lit("&") e:shift_expr() { (op, e) })* { fold_binary(first, rest) }

        rule shift_expr() -> Expression<'a>
            = first:sum() rest:(op:(lit("<<") / lit(">>")) e:sum() { (op, e) })* { fold_binary(first, rest) }

        rule sum() -> Expression<'a>
            = first:term() rest:(op:(lit("+") / lit("-")) e:term() { (op, e) })* { fold_binary(first, rest) }

        rule term() -> Expression<'a>
            = first:factor()
              rest:(op:(lit("*") / lit("/") / lit("//") / lit("%") / lit("@")) e:factor() { (op, e) })* {
                fold_binary(first, rest)
            }

        rule factor() -> Expression<'a>
            = op:(lit("+") / lit("-") / lit("~")) f:factor() {
                Expression::UnaryOp(UnaryOp { op: op.string, operand: Box::new(f) })
            }
            / power()

        rule power() -> Expression<'a>
            = a:await_primary() p:(op:lit("**") f:factor() { (op, f) })? {
                match p {
                    Some((op, f)) => fold_binary(a, vec![(op, f)]),
                    None => a,
                }
            }

        rule await_primary() -> Expression<'a>
            = lit("await") p:primary() { Expression::Await(Box::new(p)) }
            / primary()

        rule primary() -> Expression<'a>
            = a:atom() t:trailer()* { t.into_iter().fold(a, apply_trailer) }

        rule trailer() -> Trailer<'a>
            = lit(".") n:name() { Trailer::Attr(n) }
            / p:lit("(") a:arguments()? lit(")") { Trailer::Call(a.unwrap_or_default(), p.start_pos.line) }
            / lit("[") s:slices() lit("]") { Trailer::Subscript(s) }

        rule atom() -> Expression<'a>
            = n:name() { Expression::Name(n) }
            / lit("True") { Expression::Constant(crate::nodes::Constant::True) }
            / lit("False") { Expression::Constant(crate::nodes::Constant::False) }
            / lit("None") { Expression::Constant(crate::nodes::Constant::None) }
            / lit("...") { Expression::Constant(crate::nodes::Constant::Ellipsis) }
            / s:tok(TokType::String, "STRING")+ {
                Expression::Strings(Strings {
                    parts: s.into_iter().map(|t| StringPart {
                        raw: t.string,
                        line: t.start_pos.line,
                        col: t.start_pos.col,
                    }).collect(),
                })
            }
            / n:tok(TokType::Number, "NUMBER") { Expression::Number(crate::nodes::Number { raw: n.string }) }
            / lit("(") e:paren_inner() lit(")") { e }
            / lit("[") e:list_inner() lit("]") { e }
            / lit("{") e:brace_inner() lit("}") { e }

        rule paren_inner() -> Expression<'a>
            = yield_expr()
            / first:star_named_expression() tail:display_tail() {
                match tail {
                    DisplayTail::Comprehension(g) => comprehension(ComprehensionKind::Generator, first, None, g),
                    DisplayTail::Items(rest, trailing) => sequence(first, rest, trailing, true),
                }
            }
            / { Expression::Tuple(Tuple { elements: Vec::new(), parenthesized: true }) }

        rule list_inner() -> Expression<'a>
            = first:star_named_expression() tail:display_tail() {
                match tail {
                    DisplayTail::Comprehension(g) => comprehension(ComprehensionKind::List, first, None, g),
                    DisplayTail::Items(mut rest, _) => {
                        rest.insert(0, first);
                        Expression::List(List { elements: rest })
                    }
                }
            }
            / { Expression::List(List { elements: Vec::new() }) }

        rule display_tail() -> DisplayTail<'a>
            = g:comp_for()+ { DisplayTail::Comprehension(g) }
            / rest:(lit(",") e:star_named_expression() { e })* trailing:lit(",")? {
                DisplayTail::Items(rest, trailing.is_some())
            }

        rule brace_inner() -> Expression<'a>
            = first:brace_item() tail:brace_tail() {?
                match tail {
                    BraceTail::Comprehension(g) => brace_comprehension(first, g),
                    BraceTail::Items(mut rest) => {
                        rest.insert(0, first);
                        brace_display(rest)
                    }
                }
            }
            / { Expression::Dict(Dict { items: Vec::new() }) }

        rule brace_tail() -> BraceTail<'a>
            = g:comp_for()+ { BraceTail::Comprehension(g) }
            / rest:(lit(",") i:brace_item() { i })* lit(",")? { BraceTail::Items(rest) }

        rule brace_item() -> BraceItem<'a>
            = lit("**") e:bitwise_or() { BraceItem::Unpack(e) }
            / k:star_named_expression() v:(lit(":") v:expression() { v })? {
                match v {
                    Some(v) => BraceItem::Pair(k, v),
                    None => BraceItem::Element(k),
                }
            }

        rule comp_for() -> CompFor<'a>
            = a:lit("async")? lit("for") t:star_targets() lit("in") i:disjunction()
              ifs:(lit("if") c:disjunction() { c })* {
                CompFor { target: t, iter: i, ifs, is_async: a.is_some() }
            }

        rule slices() -> Vec<Expression<'a>>
            = s:(slice() ++ lit(",")) lit(",")? { s }

        rule slice() -> Expression<'a>
            = l:star_named_expression()? rest:(lit(":") u:expression()? st:(lit(":") x:expression()? { x })? { (u, st) })? {?
                match (l, rest) {
                    (Some(l), None) => Ok(l),
                    (None, None) => Err("slice"),
                    (l, Some((u, s))) => Ok(Expression::Slice(crate::nodes::Slice {
                        lower: l.map(Box::new),
                        upper: u.map(Box::new),
                        step: s.flatten().map(Box::new),
                    })),
                }
            }

        rule arguments() -> Vec<Arg<'a>>
            = a:(arg() ++ lit(",")) lit(",")? { a }

        rule arg() -> Arg<'a>
            = s:lit("**") e:expression() { Arg { value: e, keyword: None, star: Some(s.string) } }
            / s:lit("*") e:expression() { Arg { value: e, keyword: None, star: Some(s.string) } }
            / n:name() lit("=") e:expression() { Arg { value: e, keyword: Some(n), star: None } }
            / e:named_expression() g:comp_for()* {
                if g.is_empty() {
                    Arg::positional(e)
                } else {
                    Arg::positional(comprehension(ComprehensionKind::Generator, e, None, g))
                }
            }

        // ====================================================================
        // Tokens
        // ====================================================================

        rule line() -> u32
            = p:position!() { lines.get(p).copied().unwrap_or(0) }

        rule name() -> Name<'a>
            = t:tok(TokType::Name, "NAME") {?
                if is_keyword(t.string) {
                    Err("NAME")
                } else {
                    Ok(Name { value: t.string, line: t.start_pos.line, col: t.start_pos.col })
                }
            }

        rule tok(tt: TokType, err: &'static str) -> TokenRef<'input, 'a>
            = [t] {? if t.r#type == tt { Ok(t) } else { Err(err) } }

        rule lit(lit: &'static str) -> TokenRef<'input, 'a>
            = [t] {?
                if t.string == lit && matches!(t.r#type, TokType::Op | TokType::Name) {
                    Ok(t)
                } else {
                    Err(lit)
                }
            }
    }
}

// ============================================================================
// Action helpers
// ============================================================================

pub enum ExprTail<'a> {
    Annotated(Expression<'a>, Option<Expression<'a>>),
    Aug(&'a str, Expression<'a>),
    Assign(Vec<Expression<'a>>),
    Bare,
}

pub enum Trailer<'a> {
    Attr(Name<'a>),
    Call(Vec<Arg<'a>>, u32),
    Subscript(Vec<Expression<'a>>),
}

pub enum DisplayTail<'a> {
    Comprehension(Vec<CompFor<'a>>),
    Items(Vec<Expression<'a>>, bool),
}

pub enum BraceTail<'a> {
    Comprehension(Vec<CompFor<'a>>),
    Items(Vec<BraceItem<'a>>),
}

pub enum BraceItem<'a> {
    Pair(Expression<'a>, Expression<'a>),
    Unpack(Expression<'a>),
    Element(Expression<'a>),
}

fn with_decorators<'a>(stmt: Statement<'a>, decorators: Vec<Decorator<'a>>) -> Statement<'a> {
    match stmt {
        Statement::FunctionDef(mut f) => {
            f.decorators = decorators;
            Statement::FunctionDef(f)
        }
        Statement::ClassDef(mut c) => {
            c.decorators = decorators;
            Statement::ClassDef(c)
        }
        other => other,
    }
}

fn class_base(arg: Arg<'_>) -> Expression<'_> {
    match arg.star {
        Some(_) => Expression::Starred(Starred {
            value: Box::new(arg.value),
        }),
        None => arg.value,
    }
}

fn other_stmt<'a>(keyword: &Token<'a>, exprs: Vec<Expression<'a>>) -> Statement<'a> {
    Statement::Other(OtherStmt {
        keyword: keyword.string,
        exprs,
        line: keyword.start_pos.line,
    })
}

fn make_param<'a>(
    kind: crate::nodes::ParamKind,
    name: Option<Name<'a>>,
    annotation: Option<Expression<'a>>,
    default: Option<Expression<'a>>,
) -> Param<'a> {
    Param {
        kind,
        name,
        annotation,
        default,
    }
}

fn build_expr_stmt<'a>(first: Expression<'a>, tail: ExprTail<'a>, line: u32) -> Statement<'a> {
    match tail {
        ExprTail::Annotated(annotation, value) => Statement::AnnAssign(AnnAssign {
            target: first,
            annotation,
            value,
            line,
        }),
        ExprTail::Aug(op, value) => Statement::AugAssign(AugAssign {
            target: first,
            op,
            value,
            line,
        }),
        ExprTail::Assign(mut values) => {
            // `a = b = value`: every expression but the last is a target.
            let value = values.pop();
            let mut targets = vec![first];
            targets.extend(values);
            match value {
                Some(value) => Statement::Assign(Assign {
                    targets,
                    value,
                    line,
                }),
                None => Statement::Expr(ExprStmt {
                    value: targets.remove(0),
                    line,
                }),
            }
        }
        ExprTail::Bare => Statement::Expr(ExprStmt { value: first, line }),
    }
}

/// A single expression, or a tuple when there are several or a trailing comma.
fn sequence<'a>(
    first: Expression<'a>,
    rest: Vec<Expression<'a>>,
    trailing_comma: bool,
    parenthesized: bool,
) -> Expression<'a> {
    if rest.is_empty() && !trailing_comma {
        return first;
    }
    let mut elements = Vec::with_capacity(rest.len() + 1);
    elements.push(first);
    elements.extend(rest);
    Expression::Tuple(Tuple {
        elements,
        parenthesized,
    })
}

fn comprehension<'a>(
    kind: ComprehensionKind,
    element: Expression<'a>,
    value: Option<Expression<'a>>,
    generators: Vec<CompFor<'a>>,
) -> Expression<'a> {
    Expression::Comprehension(Comprehension {
        kind,
        element: Box::new(element),
        value: value.map(Box::new),
        generators,
    })
}

fn brace_comprehension<'a>(
    first: BraceItem<'a>,
    generators: Vec<CompFor<'a>>,
) -> Result<Expression<'a>, &'static str> {
    match first {
        BraceItem::Pair(k, v) => Ok(comprehension(
            ComprehensionKind::Dict,
            k,
            Some(v),
            generators,
        )),
        BraceItem::Element(e) => Ok(comprehension(ComprehensionKind::Set, e, None, generators)),
        BraceItem::Unpack(_) => Err("dict comprehension"),
    }
}

fn brace_display(items: Vec<BraceItem<'_>>) -> Result<Expression<'_>, &'static str> {
    let is_set = matches!(items.first(), Some(BraceItem::Element(_)));
    if is_set {
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            match item {
                BraceItem::Element(e) => elements.push(e),
                _ => return Err("set element"),
            }
        }
        Ok(Expression::Set(Set { elements }))
    } else {
        let mut dict_items = Vec::with_capacity(items.len());
        for item in items {
            match item {
                BraceItem::Pair(k, v) => dict_items.push(DictItem::Pair(k, v)),
                BraceItem::Unpack(e) => dict_items.push(DictItem::Unpack(e)),
                BraceItem::Element(_) => return Err("':'"),
            }
        }
        Ok(Expression::Dict(Dict { items: dict_items }))
    }
}

fn bool_op<'a>(op: &'a str, first: Expression<'a>, rest: Vec<Expression<'a>>) -> Expression<'a> {
    if rest.is_empty() {
        return first;
    }
    let mut values = Vec::with_capacity(rest.len() + 1);
    values.push(first);
    values.extend(rest);
    Expression::BoolOp(BoolOp { op, values })
}

fn fold_binary<'a>(first: Expression<'a>, rest: Vec<(&Token<'a>, Expression<'a>)>) -> Expression<'a> {
    rest.into_iter().fold(first, |left, (op, right)| {
        Expression::BinaryOp(BinaryOp {
            left: Box::new(left),
            op: op.string,
            right: Box::new(right),
        })
    })
}

fn apply_trailer<'a>(value: Expression<'a>, trailer: Trailer<'a>) -> Expression<'a> {
    match trailer {
        Trailer::Attr(attr) => Expression::Attribute(Attribute {
            value: Box::new(value),
            attr,
        }),
        Trailer::Call(args, line) => Expression::Call(Call {
            func: Box::new(value),
            args,
            line,
        }),
        Trailer::Subscript(slice) => Expression::Subscript(Subscript {
            value: Box::new(value),
            slice,
        }),
    }
}
