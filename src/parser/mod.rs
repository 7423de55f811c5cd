//! Recursive-descent parsing of the L1 grammar.

mod error;
#[allow(clippy::module_inception)]
mod parser;

pub use error::*;
pub use parser::parse;
