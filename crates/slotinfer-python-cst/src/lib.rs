// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A Python tokenizer, parser and syntax tree.
//!
//! # Overview
//!
//! - **Parsing**: Parse Python source code into a syntax tree with
//!   [`parse_module`]. Nodes borrow identifiers and literals from the source.
//! - **Traversal**: Walk the tree with a [`Visitor`] and the `walk_*`
//!   functions.
//! - **Diagnostics**: Render a [`ParserError`] against its source with
//!   [`prettify_error`].
//!
//! # Quick Start
//!
//! ```
//! use slotinfer_python_cst::{parse_module, Statement};
//!
//! let module = parse_module("class Point:\n    def __init__(self):\n        self.x = 0\n")
//!     .expect("parse error");
//! assert!(matches!(module.body[0], Statement::ClassDef(_)));
//! ```
//!
//! The grammar covers the statement and expression syntax of current Python
//! versions. Two constructs are accepted without being modelled: the patterns
//! of `case` clauses and type parameter lists. Formatted string literals are
//! kept as opaque string tokens.

use std::cmp::{max, min};

pub mod nodes;
pub mod parser;
pub mod tokenizer;
pub mod visitor;

pub use nodes::*;
pub use parser::ParserError;
pub use tokenizer::{tokenize, Pos, TokError, TokType, Token, TokenizeError};
pub use visitor::{
    walk_ann_assign, walk_arg, walk_assign, walk_attribute, walk_aug_assign, walk_body,
    walk_call, walk_class_def, walk_decorator, walk_expression, walk_function_def, walk_module,
    walk_parameters, walk_statement, VisitResult, Visitor,
};

pub type Result<T> = std::result::Result<T, ParserError>;

/// Parses a Python module.
///
/// A leading byte order mark is ignored.
///
/// # Example
///
/// ```
/// use slotinfer_python_cst::parse_module;
///
/// let module = parse_module("def f(): ...\n").expect("parse error");
/// assert_eq!(module.body.len(), 1);
/// ```
pub fn parse_module(text: &str) -> Result<Module<'_>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let tokens = tokenize(text)?;
    let lines: Vec<u32> = tokens.iter().map(|t| t.start_pos.line).collect();
    let tokvec = parser::TokVec::from(tokens);
    parser::python::file(&tokvec, &lines).map_err(ParserError::from_peg)
}

// ============================================================================
// Error formatting
// ============================================================================

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: i64) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth((n - 2) as usize)
        .map(|(index, _)| index + 1)
        .unwrap_or(source.len())
}

/// Formats a parser error into a human-readable string with source context.
///
/// The offending token is highlighted with one line of context on either
/// side.
///
/// # Example
///
/// ```
/// use slotinfer_python_cst::{parse_module, prettify_error};
///
/// let source = "def f(:\n    pass\n";
/// let err = parse_module(source).unwrap_err();
/// let formatted = prettify_error(&err, source, "example.py");
/// assert!(formatted.contains("example.py"));
/// ```
pub fn prettify_error(err: &ParserError, source: &str, label: &str) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};

    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let context = 1i64;
    let line = err.line() as i64;
    let line_start = max(1, line - context) as usize;
    let start_offset = bol_offset(source, line - context);
    let end_offset = max(bol_offset(source, line + context + 1), start_offset);
    let excerpt = &source[start_offset..end_offset];

    let (start, end) = err.span();
    let start = floor_char_boundary(excerpt, start.saturating_sub(start_offset));
    // At least the whole character at `start`; one past the end at EOF
    let width = excerpt[start..].chars().next().map_or(1, char::len_utf8);
    let end = max(end.saturating_sub(start_offset), start + width);
    let end = if end > excerpt.len() {
        excerpt.len() + 1
    } else {
        ceil_char_boundary(excerpt, end)
    };

    let title = format!("{}:{}:{}: {}", label, err.line(), err.col(), err);
    let annotation_label = err.to_string();
    let rendered = Renderer::plain()
        .render(
            Level::Error.title(&title).snippet(
                Snippet::source(excerpt)
                    .line_start(line_start)
                    .origin(label)
                    .fold(false)
                    .annotation(Level::Error.span(start..end).label(&annotation_label)),
            ),
        )
        .to_string();
    rendered
}

/// Largest char boundary of `s` at or before `index`, clamped to `s.len()`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = min(index, s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary of `s` at or after `index`, clamped to `s.len()`.
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    let mut index = min(index, s.len());
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod test {
    use super::*;

    fn parse(source: &str) -> Module<'_> {
        parse_module(source).unwrap_or_else(|e| panic!("'{}' doesn't parse: {}", source, e))
    }

    fn only_stmt<'a>(module: &'a Module<'a>) -> &'a Statement<'a> {
        assert_eq!(module.body.len(), 1, "{:?}", module.body);
        &module.body[0]
    }

    mod statements {
        use super::*;

        #[test]
        fn test_bare_minimum_funcdef() {
            parse("def f(): ...");
        }

        #[test]
        fn test_funcdef_params() {
            let module = parse("def g(a, b: int = 1, /, *args, c, d=2, **kw) -> None: ...\n");
            let Statement::FunctionDef(f) = only_stmt(&module) else {
                panic!("expected function");
            };
            let kinds: Vec<ParamKind> = f.params.params.iter().map(|p| p.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    ParamKind::Normal,
                    ParamKind::Normal,
                    ParamKind::PositionalOnlyMarker,
                    ParamKind::VarPositional,
                    ParamKind::Normal,
                    ParamKind::Normal,
                    ParamKind::VarKeyword,
                ]
            );
            assert!(f.returns.is_some());
        }

        #[test]
        fn test_class_bases_and_keywords() {
            let module = parse("class A(B, mod.C, *rest, metaclass=Meta, **kw):\n    pass\n");
            let Statement::ClassDef(c) = only_stmt(&module) else {
                panic!("expected class");
            };
            assert_eq!(c.bases.len(), 3);
            assert!(matches!(c.bases[0], Expression::Name(Name { value: "B", .. })));
            assert!(matches!(c.bases[1], Expression::Attribute(_)));
            assert!(matches!(c.bases[2], Expression::Starred(_)));
            assert_eq!(c.keywords.len(), 2);
            assert_eq!(c.keywords[0].keyword.map(|k| k.value), Some("metaclass"));
        }

        #[test]
        fn test_decorator_lines() {
            let source = "\
class A:
    @property
    @slots
    def __init__(self):
        pass
";
            let module = parse(source);
            let Statement::ClassDef(c) = only_stmt(&module) else {
                panic!("expected class");
            };
            let Statement::FunctionDef(f) = &c.body[0] else {
                panic!("expected function");
            };
            assert_eq!(f.line, 4);
            assert_eq!(f.first_line(), 2);
            assert_eq!(f.decorators.len(), 2);
            assert_eq!((f.decorators[1].line, f.decorators[1].end_line), (3, 3));
            assert_eq!(f.decorators[1].dotted_name().as_deref(), Some("slots"));
        }

        #[test]
        fn test_multiline_decorator_end_line() {
            let module = parse("@register(\n    name='x',\n)\ndef f(): pass\n");
            let Statement::FunctionDef(f) = only_stmt(&module) else {
                panic!("expected function");
            };
            assert_eq!((f.decorators[0].line, f.decorators[0].end_line), (1, 3));
            assert_eq!(f.decorators[0].dotted_name(), None);
        }

        #[test]
        fn test_dotted_decorator_name() {
            let module = parse("@slot.s\ndef f(): pass\n");
            let Statement::FunctionDef(f) = only_stmt(&module) else {
                panic!("expected function");
            };
            assert_eq!(f.decorators[0].dotted_name().as_deref(), Some("slot.s"));
        }

        #[test]
        fn test_assignments() {
            let module = parse("a = b = 1\nself.x: int = 2\nself.y: str\nn += 1\n");
            let Statement::Assign(a) = &module.body[0] else {
                panic!("expected assign");
            };
            assert_eq!(a.targets.len(), 2);
            assert!(matches!(&module.body[1], Statement::AnnAssign(x) if x.value.is_some()));
            assert!(matches!(&module.body[2], Statement::AnnAssign(x) if x.value.is_none()));
            assert!(matches!(&module.body[3], Statement::AugAssign(x) if x.op == "+="));
        }

        #[test]
        fn test_tuple_unpacking_target() {
            let module = parse("self.a, (self.b, tmp) = f()\n");
            let Statement::Assign(a) = only_stmt(&module) else {
                panic!("expected assign");
            };
            let Expression::Tuple(t) = &a.targets[0] else {
                panic!("expected tuple target");
            };
            assert!(!t.parenthesized);
            assert!(matches!(&t.elements[1], Expression::Tuple(inner) if inner.parenthesized));
        }

        #[test]
        fn test_compound_statements() {
            let source = "\
if a:
    pass
elif b:
    pass
else:
    pass
for x, y in pairs:
    continue
while True:
    break
with open(p) as f, lock:
    pass
try:
    pass
except (A, B) as e:
    raise
except* C:
    pass
else:
    pass
finally:
    pass
async def g():
    async with x:
        await y
    async for z in w:
        pass
";
            let module = parse(source);
            assert_eq!(module.body.len(), 6);
            let Statement::If(i) = &module.body[0] else {
                panic!("expected if");
            };
            assert!(matches!(&i.orelse[0], Statement::If(elif) if elif.line == 3));
        }

        #[test]
        fn test_match_statement() {
            let source = "\
match command.split():
    case [action]:
        pass
    case {'x': x, **rest} if x > 0:
        pass
    case Point(x=0) | None:
        pass
    case _:
        pass
match = 1
";
            let module = parse(source);
            let Statement::Match(m) = &module.body[0] else {
                panic!("expected match");
            };
            assert_eq!(m.cases.len(), 4);
            assert!(m.cases[1].guard.is_some());
            assert!(matches!(&module.body[1], Statement::Assign(_)));
        }

        #[test]
        fn test_imports() {
            let module = parse("import a.b as c, d\nfrom ..pkg import (x as y, z,)\nfrom m import *\n");
            let Statement::Import(i) = &module.body[0] else {
                panic!("expected import");
            };
            assert_eq!(i.names[0].bound_name(), Some("c"));
            assert_eq!(i.names[1].bound_name(), Some("d"));
            let Statement::ImportFrom(f) = &module.body[1] else {
                panic!("expected from-import");
            };
            assert_eq!(f.level, 2);
            assert_eq!(f.names.len(), 2);
            assert!(matches!(&module.body[2], Statement::ImportFrom(f) if f.star));
        }

        #[test]
        fn test_simple_statements() {
            let source = "\
del a[0], b.c
assert x, 'msg'
global g
nonlocal n
type Alias = list[int]
return
yield x
x = yield
pass; pass;
";
            let module = parse(source);
            assert_eq!(module.body.len(), 10);
        }

        #[test]
        fn test_generic_definitions() {
            parse("def first[T](xs: list[T]) -> T: ...\nclass Box[T: int]:\n    pass\n");
        }

        #[test]
        fn test_statement_lines() {
            let module = parse("x = 1\n\n# comment\ny = (\n  2\n)\nz = 3\n");
            let lines: Vec<u32> = module.body.iter().map(|s| s.line()).collect();
            assert_eq!(lines, vec![1, 4, 7]);
        }

        #[test]
        fn test_single_statement_with_no_newline() {
            for src in &[
                "(\n \\\n)",
                "(\n    '''\n''')",
                "del _",
                "if _:\n    '''\n)'''",
                "if _:\n    ('''\n''')",
            ] {
                parse(src);
            }
        }
    }

    mod expressions {
        use super::*;

        fn expr<'a>(module: &'a Module<'a>) -> &'a Expression<'a> {
            match only_stmt(module) {
                Statement::Expr(e) => &e.value,
                Statement::Assign(a) => &a.value,
                other => panic!("unexpected statement {:?}", other),
            }
        }

        #[test]
        fn test_super_init_call_shape() {
            let module = parse("super().__init__(a, b=1)\n");
            let Expression::Call(call) = expr(&module) else {
                panic!("expected call");
            };
            let Expression::Attribute(attr) = call.func.as_ref() else {
                panic!("expected attribute");
            };
            assert_eq!(attr.attr.value, "__init__");
            assert!(matches!(attr.value.as_ref(), Expression::Call(_)));
            assert_eq!(call.args.len(), 2);
        }

        #[test]
        fn test_precedence() {
            let module = parse("a + b * c ** -d\n");
            let Expression::BinaryOp(add) = expr(&module) else {
                panic!("expected binary op");
            };
            assert_eq!(add.op, "+");
            assert!(matches!(add.right.as_ref(), Expression::BinaryOp(mul) if mul.op == "*"));
        }

        #[test]
        fn test_boolean_and_comparison() {
            let module = parse("not a and b or c < d <= e is not f not in g\n");
            let Expression::BoolOp(or) = expr(&module) else {
                panic!("expected or");
            };
            assert_eq!(or.op, "or");
            let Expression::Compare(cmp) = &or.values[1] else {
                panic!("expected comparison");
            };
            assert_eq!(
                cmp.comparisons.iter().map(|(op, _)| *op).collect::<Vec<_>>(),
                vec![CompOp::Lt, CompOp::LtE, CompOp::IsNot, CompOp::NotIn]
            );
        }

        #[test]
        fn test_displays_and_comprehensions() {
            for (source, check) in [
                ("x = ()\n", "tuple"),
                ("x = (1,)\n", "tuple"),
                ("x = (1)\n", "number"),
                ("x = [1, *a]\n", "list"),
                ("x = {1, 2}\n", "set"),
                ("x = {}\n", "dict"),
                ("x = {'a': 1, **b}\n", "dict"),
                ("x = [i for i in r if i]\n", "comprehension"),
                ("x = {k: v for k, v in d.items()}\n", "comprehension"),
                ("x = (i async for i in r)\n", "comprehension"),
            ] {
                let module = parse(source);
                let kind = match expr(&module) {
                    Expression::Tuple(_) => "tuple",
                    Expression::Number(_) => "number",
                    Expression::List(_) => "list",
                    Expression::Set(_) => "set",
                    Expression::Dict(_) => "dict",
                    Expression::Comprehension(_) => "comprehension",
                    other => panic!("unexpected {:?}", other),
                };
                assert_eq!(kind, check, "{}", source);
            }
        }

        #[test]
        fn test_misc_expressions() {
            for source in [
                "f(x for x in y)\n",
                "f(*args, **kwargs)\n",
                "a[1:2, ::3, i]\n",
                "lambda x, *y, z=1: x if y else z\n",
                "(n := len(a)) > 10\n",
                "await g()\n",
                "x = 'a' 'b' f'{c}'\n",
                "x = ...\n",
                "x = -1 ** 2 @ m | 3 ^ 4 & 5 << 6\n",
            ] {
                parse(source);
            }
        }

        #[test]
        fn test_string_values() {
            let module = parse("x = ('a' \"b\")\n");
            let Expression::Strings(s) = expr(&module) else {
                panic!("expected strings");
            };
            assert_eq!(s.value().as_deref(), Some("ab"));
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_tokenizer_error() {
            let err = parse_module("x = 'oops\n").unwrap_err();
            assert!(matches!(
                err,
                ParserError::TokenizerError {
                    error: TokError::UnterminatedString,
                    line: 1,
                    col: 5,
                    ..
                }
            ));
        }

        #[test]
        fn test_parser_error_location() {
            let err = parse_module("x = 1\ndef f(:\n    pass\n").unwrap_err();
            assert!(matches!(err, ParserError::ParserError { .. }));
            assert_eq!((err.line(), err.col()), (2, 7));
        }

        #[test]
        fn test_keyword_is_not_a_name() {
            assert!(parse_module("class = 1\n").is_err());
            assert!(parse_module("self.def = 1\n").is_err());
        }

        #[test]
        fn test_prettify_error_shows_source() {
            let source = "x = 1\ndef f(:\n    pass\n";
            let err = parse_module(source).unwrap_err();
            let formatted = prettify_error(&err, source, "bad.py");
            assert!(formatted.contains("bad.py:2:7"));
            assert!(formatted.contains("def f(:"));
        }

        #[test]
        fn test_prettify_error_at_multibyte_character() {
            let sources = [
                "y = \u{a7}\n",
                "\u{1f600} = 1\n",
                "x = 1 + \u{2028}\n",
                "x = 1\ny = \u{e9}\u{a7}\n",
            ];
            for source in sources {
                let err = parse_module(source).unwrap_err();
                let formatted = prettify_error(&err, source, "multibyte.py");
                assert!(formatted.contains("multibyte.py"), "{}", formatted);
            }
        }

        #[test]
        fn char_boundaries() {
            let s = "a\u{e9}b";
            assert_eq!(floor_char_boundary(s, 2), 1);
            assert_eq!(ceil_char_boundary(s, 2), 3);
            assert_eq!(floor_char_boundary(s, 9), s.len());
            assert_eq!(ceil_char_boundary(s, 3), 3);
        }

        #[test]
        fn bol_offset_lines() {
            assert_eq!(0, bol_offset("hello", 1));
            assert_eq!(0, bol_offset("hello", 0));
            assert_eq!(6, bol_offset("hello\nhello", 2));
            assert_eq!(11, bol_offset("hello\nhello", 3));
            assert_eq!(5, bol_offset("hello", 3));
        }
    }
}
