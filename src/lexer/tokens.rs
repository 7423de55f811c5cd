//! Tokens, as produced by the lexer.
use std::fmt::{self, Display, Formatter};

use crate::ast::{ArithOp, LogicOp, RelOp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An integer literal.
    Num(i32),
    /// An identifier.
    Id(String),
    /// The `int` type keyword.
    IntType,
    If,
    Else,
    While,
    Def,
    Return,
    Output,
    ArithOp(ArithOp),
    RelOp(RelOp),
    LogicOp(LogicOp),
    /// Logical negation, `!`.
    Not,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    /// The assignment symbol, `:=`.
    Assign,
    /// The type ascription symbol, `:`.
    HasType,
    Comma,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Num(value) => write!(f, "{}", value),
            Self::Id(name) => f.write_str(name),
            Self::IntType => f.write_str("int"),
            Self::If => f.write_str("if"),
            Self::Else => f.write_str("else"),
            Self::While => f.write_str("while"),
            Self::Def => f.write_str("def"),
            Self::Return => f.write_str("return"),
            Self::Output => f.write_str("output"),
            Self::ArithOp(op) => write!(f, "{}", op),
            Self::RelOp(op) => write!(f, "{}", op),
            Self::LogicOp(op) => write!(f, "{}", op),
            Self::Not => f.write_str("!"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::LBrace => f.write_str("{"),
            Self::RBrace => f.write_str("}"),
            Self::Semicolon => f.write_str(";"),
            Self::Assign => f.write_str(":="),
            Self::HasType => f.write_str(":"),
            Self::Comma => f.write_str(","),
        }
    }
}
