// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Python tokenizer.

pub mod core;


use thiserror::Error;

pub use self::core::{Pos, TokError, TokState, TokType};

/// A token with the slice of source it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub r#type: TokType,
    pub string: &'a str,
    pub start_pos: Pos,
    pub end_pos: Pos,
}

/// A tokenizer error and where it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (line {}, column {})", .pos.line, .pos.col)]
pub struct TokenizeError {
    pub error: TokError,
    pub pos: Pos,
}

/// Tokenize a whole source text. The last token is always the end marker.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, TokenizeError> {
    let mut state = TokState::new(text);
    let mut tokens = Vec::new();
    while let Some(tok) = state.next() {
        match tok {
            Ok(r#type) => tokens.push(Token {
                r#type,
                string: state.current_slice(),
                start_pos: state.start_pos,
                end_pos: state.text_pos,
            }),
            Err(error) => {
                return Err(TokenizeError {
                    error,
                    pos: state.start_pos,
                })
            }
        }
    }
    Ok(tokens)
}
