use thiserror::Error;

use crate::error::PositionalError;

/// An error produced while tokenizing source text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("invalid lexeme '{lexeme}' at position {position}")]
    InvalidLexeme { lexeme: char, position: usize },
    #[error("invalid integer literal '{literal}' at position {position}")]
    IntegerLiteral { literal: String, position: usize },
}

impl PositionalError for LexError {
    fn position(&self) -> usize {
        match self {
            Self::InvalidLexeme { position, .. } => *position,
            Self::IntegerLiteral { position, .. } => *position,
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}
