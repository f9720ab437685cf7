// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::parser::grammar::ParseLoc;
use crate::tokenizer::{TokError, TokenizeError};

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("tokenizer error: {error}")]
    TokenizerError {
        error: TokError,
        line: u32,
        col: u32,
        offset: usize,
    },
    #[error("parser error: expected {expected}, found {}", describe_token(&.location.token))]
    ParserError { expected: String, location: ParseLoc },
}

impl ParserError {
    /// Line of the error (1-indexed).
    pub fn line(&self) -> u32 {
        match self {
            ParserError::TokenizerError { line, .. } => *line,
            ParserError::ParserError { location, .. } => location.line,
        }
    }

    /// Column of the error (1-indexed).
    pub fn col(&self) -> u32 {
        match self {
            ParserError::TokenizerError { col, .. } => *col,
            ParserError::ParserError { location, .. } => location.col,
        }
    }

    /// Byte range to highlight in the source.
    pub(crate) fn span(&self) -> (usize, usize) {
        match self {
            ParserError::TokenizerError { offset, .. } => (*offset, *offset),
            ParserError::ParserError { location, .. } => (location.offset, location.end_offset),
        }
    }

    pub(crate) fn from_peg(err: peg::error::ParseError<ParseLoc>) -> Self {
        ParserError::ParserError {
            expected: err.expected.to_string(),
            location: err.location,
        }
    }
}

impl From<TokenizeError> for ParserError {
    fn from(err: TokenizeError) -> Self {
        ParserError::TokenizerError {
            error: err.error,
            line: err.pos.line,
            col: err.pos.col,
            offset: err.pos.offset,
        }
    }
}

fn describe_token(token: &str) -> String {
    match token {
        "" => "end of input".to_string(),
        "\n" | "\r\n" => "end of line".to_string(),
        t => format!("'{}'", t),
    }
}
