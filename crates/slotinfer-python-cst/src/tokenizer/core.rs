// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The tokenizer state machine.
//!
//! [`TokState`] is an iterator of [`TokType`]s. After each item,
//! `start_pos..text_pos` delimits the text of the token just produced.
//!
//! Layout handling follows the Python lexical rules: INDENT/DEDENT tokens
//! come from an indentation stack (tabs advance to the next multiple of 8),
//! blank and comment-only lines produce no tokens, and no NEWLINE or INDENT
//! is produced inside brackets or after a backslash continuation.

use thiserror::Error;

const TAB_SIZE: usize = 8;

const STRING_PREFIXES: &[&str] = &[
    "r", "u", "b", "f", "t", "br", "rb", "fr", "rf", "tr", "rt",
];

const OPERATORS_3: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];

const OPERATORS_2: &[&str] = &[
    "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", ":=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];

const OPERATORS_1: &str = "+-*/%@&|^~<>()[]{},:;.=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokType {
    Name,
    Number,
    String,
    Op,
    Newline,
    Indent,
    Dedent,
    EndMarker,
}

/// A position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column, counted in characters.
    pub col: u32,
    /// 0-indexed byte offset.
    pub offset: usize,
}

impl Pos {
    pub fn start() -> Self {
        Pos {
            line: 1,
            col: 1,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated triple-quoted string literal")]
    UnterminatedTripleQuotedString,
    #[error("unindent does not match any outer indentation level")]
    Dedent,
    #[error("unmatched '{0}'")]
    UnmatchedClosingParen(char),
    #[error("closing parenthesis '{closing}' does not match opening parenthesis '{opening}'")]
    MismatchedClosingParen { opening: char, closing: char },
    #[error("'{0}' was never closed")]
    UnclosedParen(char),
    #[error("unexpected character after line continuation character")]
    BadLineContinuation,
    #[error("invalid character '{0}' in source")]
    BadCharacter(char),
}

pub struct TokState<'t> {
    text: &'t str,
    /// Start of the most recent token (or of the error).
    pub start_pos: Pos,
    /// Current position; the end of the most recent token.
    pub text_pos: Pos,
    at_bol: bool,
    line_has_content: bool,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    paren_stack: Vec<(char, Pos)>,
    done: bool,
    failed: bool,
}

impl<'t> TokState<'t> {
    pub fn new(text: &'t str) -> Self {
        TokState {
            text,
            start_pos: Pos::start(),
            text_pos: Pos::start(),
            at_bol: true,
            line_has_content: false,
            indent_stack: vec![0],
            pending_dedents: 0,
            paren_stack: Vec::new(),
            done: false,
            failed: false,
        }
    }

    /// Text of the most recent token.
    pub fn current_slice(&self) -> &'t str {
        &self.text[self.start_pos.offset..self.text_pos.offset]
    }

    fn rest(&self) -> &'t str {
        &self.text[self.text_pos.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.text_pos.offset += c.len_utf8();
        if c == '\n' {
            self.text_pos.line += 1;
            self.text_pos.col = 1;
        } else {
            self.text_pos.col += 1;
        }
        Some(c)
    }

    fn next_token(&mut self) -> Result<Option<TokType>, TokError> {
        loop {
            if self.pending_dedents > 0 {
                self.pending_dedents -= 1;
                self.start_pos = self.text_pos;
                return Ok(Some(TokType::Dedent));
            }

            if self.at_bol && self.paren_stack.is_empty() {
                let line_start = self.text_pos;
                let width = self.consume_indentation();
                match self.peek() {
                    Some('#') | Some('\n') | Some('\r') => {
                        self.skip_comment();
                        self.consume_newline();
                        continue;
                    }
                    None => self.at_bol = false,
                    Some(_) => {
                        self.at_bol = false;
                        if let Some(tok) = self.indentation_change(line_start, width)? {
                            return Ok(Some(tok));
                        }
                    }
                }
            }

            self.skip_whitespace();
            self.start_pos = self.text_pos;
            let Some(c) = self.peek() else {
                return self.end_of_input();
            };

            match c {
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '\\' => {
                    self.bump();
                    match self.peek() {
                        Some('\n') | Some('\r') => self.consume_newline(),
                        _ => return Err(TokError::BadLineContinuation),
                    }
                    continue;
                }
                '\n' | '\r' => {
                    self.consume_newline();
                    if !self.paren_stack.is_empty() {
                        continue;
                    }
                    self.at_bol = true;
                    if self.line_has_content {
                        self.line_has_content = false;
                        return Ok(Some(TokType::Newline));
                    }
                    continue;
                }
                _ => {}
            }

            self.line_has_content = true;
            let tok = if is_identifier_start(c) {
                match self.string_prefix_len() {
                    Some(len) => {
                        let formatted = is_formatted_prefix(&self.rest()[..len]);
                        for _ in 0..len {
                            self.bump();
                        }
                        self.string(formatted)?
                    }
                    None => self.identifier(),
                }
            } else if c.is_ascii_digit()
                || (c == '.' && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()))
            {
                self.number()
            } else if c == '\'' || c == '"' {
                self.string(false)?
            } else {
                self.operator(c)?
            };
            return Ok(Some(tok));
        }
    }

    fn indentation_change(
        &mut self,
        line_start: Pos,
        width: usize,
    ) -> Result<Option<TokType>, TokError> {
        let current = self.indent_stack.last().copied().unwrap_or(0);
        if width > current {
            self.indent_stack.push(width);
            self.start_pos = line_start;
            return Ok(Some(TokType::Indent));
        }
        if width < current {
            let mut count = 0;
            while self.indent_stack.last().copied().unwrap_or(0) > width {
                self.indent_stack.pop();
                count += 1;
            }
            self.start_pos = self.text_pos;
            if self.indent_stack.last().copied().unwrap_or(0) != width {
                return Err(TokError::Dedent);
            }
            self.pending_dedents = count - 1;
            return Ok(Some(TokType::Dedent));
        }
        Ok(None)
    }

    fn end_of_input(&mut self) -> Result<Option<TokType>, TokError> {
        if let Some(&(open, pos)) = self.paren_stack.last() {
            self.start_pos = pos;
            return Err(TokError::UnclosedParen(open));
        }
        if self.line_has_content {
            self.line_has_content = false;
            return Ok(Some(TokType::Newline));
        }
        if self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            return Ok(Some(TokType::Dedent));
        }
        if !self.done {
            self.done = true;
            return Ok(Some(TokType::EndMarker));
        }
        Ok(None)
    }

    fn consume_indentation(&mut self) -> usize {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / TAB_SIZE + 1) * TAB_SIZE,
                '\x0c' => width = 0,
                _ => break,
            }
            self.bump();
        }
        width
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\x0c')) {
            self.bump();
        }
    }

    fn skip_comment(&mut self) {
        if self.peek() != Some('#') {
            return;
        }
        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                break;
            }
            self.bump();
        }
    }

    fn consume_newline(&mut self) {
        if self.peek() == Some('\r') {
            self.bump();
        }
        if self.peek() == Some('\n') {
            self.bump();
        }
    }

    fn identifier(&mut self) -> TokType {
        while self.peek().is_some_and(is_identifier_continue) {
            self.bump();
        }
        TokType::Name
    }

    fn string_prefix_len(&self) -> Option<usize> {
        let rest = self.rest();
        let len = rest.find(|c: char| !c.is_ascii_alphabetic())?;
        if len == 0 || len > 2 {
            return None;
        }
        let quote = rest[len..].chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let prefix = rest[..len].to_ascii_lowercase();
        STRING_PREFIXES.contains(&prefix.as_str()).then_some(len)
    }

    /// Scan a string literal starting at its opening quote.
    ///
    /// In a formatted string (`f` or `t` prefix) quotes inside a replacement
    /// field open nested literals, so they may reuse the outer quote.
    fn string(&mut self, formatted: bool) -> Result<TokType, TokError> {
        let Some(quote) = self.bump() else {
            return Err(TokError::UnterminatedString);
        };
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }
        let unterminated = if triple {
            TokError::UnterminatedTripleQuotedString
        } else {
            TokError::UnterminatedString
        };

        let mut depth = 0usize;
        loop {
            if depth > 0 {
                if let Some(len) = self.string_prefix_len() {
                    let nested = is_formatted_prefix(&self.rest()[..len]);
                    for _ in 0..len {
                        self.bump();
                    }
                    self.string(nested)?;
                    continue;
                }
                if matches!(self.peek(), Some('\'') | Some('"')) {
                    self.string(false)?;
                    continue;
                }
            }
            match self.bump() {
                None => return Err(unterminated),
                Some('\n') if !triple && depth == 0 => return Err(unterminated),
                Some('\\') => {
                    if self.peek() == Some('\r') {
                        self.bump();
                    }
                    self.bump();
                }
                Some('{') if formatted => {
                    if depth == 0 && self.peek() == Some('{') {
                        self.bump();
                    } else {
                        depth += 1;
                    }
                }
                Some('}') if formatted && depth > 0 => depth -= 1,
                Some(c) if c == quote && depth == 0 => {
                    if !triple {
                        return Ok(TokType::String);
                    }
                    if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        return Ok(TokType::String);
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    fn number(&mut self) -> TokType {
        let radix = self.peek() == Some('0')
            && matches!(
                self.peek_nth(1),
                Some('x') | Some('X') | Some('o') | Some('O') | Some('b') | Some('B')
            );
        if radix {
            self.bump();
            self.bump();
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                self.bump();
            }
            return TokType::Number;
        }

        self.eat_digits();
        if self.peek() == Some('.') {
            self.bump();
            self.eat_digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let digit_follows = match self.peek_nth(1) {
                Some(d) if d.is_ascii_digit() => true,
                Some('+') | Some('-') => self.peek_nth(2).is_some_and(|d| d.is_ascii_digit()),
                _ => false,
            };
            if digit_follows {
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                self.eat_digits();
            }
        }
        if matches!(self.peek(), Some('j') | Some('J')) {
            self.bump();
        }
        TokType::Number
    }

    fn operator(&mut self, c: char) -> Result<TokType, TokError> {
        let rest = self.rest();
        for op in OPERATORS_3.iter().chain(OPERATORS_2.iter()) {
            if rest.starts_with(op) {
                for _ in 0..op.len() {
                    self.bump();
                }
                return Ok(TokType::Op);
            }
        }
        if !OPERATORS_1.contains(c) {
            return Err(TokError::BadCharacter(c));
        }
        self.bump();
        match c {
            '(' | '[' | '{' => self.paren_stack.push((c, self.start_pos)),
            ')' | ']' | '}' => match self.paren_stack.pop() {
                None => return Err(TokError::UnmatchedClosingParen(c)),
                Some((opening, _)) if closing_for(opening) != c => {
                    return Err(TokError::MismatchedClosingParen {
                        opening,
                        closing: c,
                    })
                }
                Some(_) => {}
            },
            _ => {}
        }
        Ok(TokType::Op)
    }
}

impl<'t> Iterator for TokState<'t> {
    type Item = Result<TokType, TokError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(tok) => tok.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

fn closing_for(opening: char) -> char {
    match opening {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_formatted_prefix(prefix: &str) -> bool {
    prefix.chars().any(|c| matches!(c, 'f' | 'F' | 't' | 'T'))
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
