//! Tokenization of L1 source text.

mod error;
#[allow(clippy::module_inception)]
mod lexer;
mod tokens;

pub use error::*;
pub use lexer::lex;
pub use tokens::*;
