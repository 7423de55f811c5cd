//! Lexing functions for constructing a token stream.
use std::{iter::Peekable, str::CharIndices};

use crate::ast::{ArithOp, LogicOp, RelOp};

use super::{error::*, tokens::*};

/// Tokenize an L1 source string.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'s> {
    chars: Peekable<CharIndices<'s>>,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            tokens: vec![],
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(&(position, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
                continue;
            }

            let token = match ch {
                '/' if self.lookahead_is('/') => {
                    self.skip_comment();
                    continue;
                }
                '0'..='9' => self.number(position, false)?,
                // A minus sign can only start a negative literal where no
                // expression is already in progress.
                '-' if self.lookahead_is_digit() && !self.value_precedes() => {
                    self.chars.next();
                    self.number(position, true)?
                }
                ch if ch.is_ascii_alphabetic() || ch == '_' => self.word(),
                _ => self.symbol(position, ch)?,
            };
            self.tokens.push(token);
        }

        Ok(self.tokens)
    }

    /// Returns true when the previous token ends a value, which makes a
    /// following `-` a binary operator rather than a sign.
    fn value_precedes(&self) -> bool {
        matches!(
            self.tokens.last(),
            Some(Token::Num(_)) | Some(Token::Id(_)) | Some(Token::RParen)
        )
    }

    fn lookahead_is(&self, expected: char) -> bool {
        let mut chars = self.chars.clone();
        chars.next();
        matches!(chars.peek(), Some(&(_, ch)) if ch == expected)
    }

    fn lookahead_is_digit(&self) -> bool {
        let mut chars = self.chars.clone();
        chars.next();
        matches!(chars.peek(), Some(&(_, ch)) if ch.is_ascii_digit())
    }

    fn skip_comment(&mut self) {
        for (_, ch) in self.chars.by_ref() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn number(&mut self, position: usize, negative: bool) -> Result<Token, LexError> {
        let mut literal = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            literal.push(ch);
            self.chars.next();
        }

        let value: i32 = literal
            .parse()
            .map_err(|_| LexError::IntegerLiteral { literal, position })?;

        Ok(Token::Num(if negative { -value } else { value }))
    }

    fn word(&mut self) -> Token {
        let mut word = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_ascii_alphanumeric() && ch != '_' {
                break;
            }
            word.push(ch);
            self.chars.next();
        }

        match word.as_str() {
            "int" => Token::IntType,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "def" => Token::Def,
            "return" => Token::Return,
            "output" => Token::Output,
            _ => Token::Id(word),
        }
    }

    fn symbol(&mut self, position: usize, ch: char) -> Result<Token, LexError> {
        self.chars.next();
        let token = match ch {
            '+' => Token::ArithOp(ArithOp::Add),
            '-' => Token::ArithOp(ArithOp::Sub),
            '*' => Token::ArithOp(ArithOp::Mul),
            '=' => Token::RelOp(RelOp::Eq),
            '<' => {
                if self.recognise('=') {
                    Token::RelOp(RelOp::Le)
                } else {
                    Token::RelOp(RelOp::Lt)
                }
            }
            '&' if self.recognise('&') => Token::LogicOp(LogicOp::And),
            '|' if self.recognise('|') => Token::LogicOp(LogicOp::Or),
            '!' => Token::Not,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ';' => Token::Semicolon,
            ':' => {
                if self.recognise('=') {
                    Token::Assign
                } else {
                    Token::HasType
                }
            }
            ',' => Token::Comma,
            lexeme => return Err(LexError::InvalidLexeme { lexeme, position }),
        };
        Ok(token)
    }

    /// Consumes the next character if it matches `expected`.
    fn recognise(&mut self, expected: char) -> bool {
        match self.chars.peek() {
            Some(&(_, ch)) if ch == expected => {
                self.chars.next();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_lexes {
        ($source:expr, $tokens:expr) => {{
            let tokens = lex($source).unwrap();
            assert_eq!($tokens.to_vec(), tokens);
        }};
    }

    #[test]
    fn single_tokens_lex() {
        assert_lexes!("x", [Token::Id("x".to_string())]);
        assert_lexes!("3", [Token::Num(3)]);
        assert_lexes!("-42", [Token::Num(-42)]);
        assert_lexes!("int", [Token::IntType]);
        assert_lexes!("uint", [Token::Id("uint".to_string())]);
        assert_lexes!("if", [Token::If]);
        assert_lexes!("else", [Token::Else]);
        assert_lexes!("while", [Token::While]);
        assert_lexes!("def", [Token::Def]);
        assert_lexes!("return", [Token::Return]);
        assert_lexes!("output", [Token::Output]);
        assert_lexes!("+", [Token::ArithOp(ArithOp::Add)]);
        assert_lexes!("-", [Token::ArithOp(ArithOp::Sub)]);
        assert_lexes!("*", [Token::ArithOp(ArithOp::Mul)]);
        assert_lexes!("<", [Token::RelOp(RelOp::Lt)]);
        assert_lexes!("<=", [Token::RelOp(RelOp::Le)]);
        assert_lexes!("=", [Token::RelOp(RelOp::Eq)]);
        assert_lexes!("&&", [Token::LogicOp(LogicOp::And)]);
        assert_lexes!("||", [Token::LogicOp(LogicOp::Or)]);
        assert_lexes!("!", [Token::Not]);
        assert_lexes!("(", [Token::LParen]);
        assert_lexes!(")", [Token::RParen]);
        assert_lexes!("{", [Token::LBrace]);
        assert_lexes!("}", [Token::RBrace]);
        assert_lexes!(";", [Token::Semicolon]);
        assert_lexes!(":=", [Token::Assign]);
        assert_lexes!(":", [Token::HasType]);
        assert_lexes!(",", [Token::Comma]);
    }

    #[test]
    fn minus_after_value_is_an_operator() {
        assert_lexes!(
            "1-2",
            [
                Token::Num(1),
                Token::ArithOp(ArithOp::Sub),
                Token::Num(2)
            ]
        );
        assert_lexes!(
            "x := -4;",
            [
                Token::Id("x".to_string()),
                Token::Assign,
                Token::Num(-4),
                Token::Semicolon
            ]
        );
    }

    #[test]
    fn whitespace_and_comments_are_skipped() {
        assert_lexes!("x (", [Token::Id("x".to_string()), Token::LParen]);
        assert_lexes!("\nwhile//\n;", [Token::While, Token::Semicolon]);
        assert_lexes!("  def\n\nif", [Token::Def, Token::If]);
    }

    #[test]
    fn invalid_lexemes_are_rejected_with_position() {
        assert_eq!(
            lex("&").unwrap_err(),
            LexError::InvalidLexeme {
                lexeme: '&',
                position: 0
            }
        );
        assert_eq!(
            lex("x |").unwrap_err(),
            LexError::InvalidLexeme {
                lexeme: '|',
                position: 2
            }
        );
        assert!(lex(">").is_err());
    }
}
