use thiserror::Error;

use crate::lexer::Token;

/// An error produced while parsing a token stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected token '{found}', expected {expected}")]
    UnexpectedToken { found: Token, expected: String },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEndOfInput { expected: String },
    #[error("trailing tokens after the output expression, starting at '{0}'")]
    TrailingTokens(Token),
}
