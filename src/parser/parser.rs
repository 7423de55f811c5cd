//! The parser proper. One function per grammar production.
use crate::{
    ast::*,
    lexer::Token,
};

use super::error::*;

/// Parse a token stream into an L1 [`Program`].
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    Parser::new(tokens).program()
}

struct Parser<'t> {
    tokens: &'t [Token],
    position: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// `prog := fundef* block 'output' ae ';'`
    fn program(&mut self) -> Result<Program, ParseError> {
        let mut functions = vec![];
        while self.peek() == Some(&Token::Def) {
            functions.push(self.function_def()?);
        }

        let top_level = self.block()?;

        self.expect(Token::Output, "'output'")?;
        let result = self.arith_expr()?;
        self.expect(Token::Semicolon, "';'")?;

        if let Some(trailing) = self.peek() {
            return Err(ParseError::TrailingTokens(trailing.clone()));
        }

        Ok(Program {
            functions,
            top_level,
            result,
        })
    }

    /// `fundef := 'def' id '(' params? ')' ':' 'int' '{' block 'return' ae ';' '}'`
    fn function_def(&mut self) -> Result<FunctionDef, ParseError> {
        self.expect(Token::Def, "'def'")?;
        let name = self.identifier()?;
        self.expect(Token::LParen, "'('")?;

        let mut params = vec![];
        while self.peek() != Some(&Token::RParen) {
            if !params.is_empty() {
                self.expect(Token::Comma, "','")?;
            }
            self.expect(Token::IntType, "a parameter type")?;
            params.push((Type::Int, self.identifier()?));
        }
        self.expect(Token::RParen, "')'")?;

        self.expect(Token::HasType, "':'")?;
        self.expect(Token::IntType, "a return type")?;

        self.expect(Token::LBrace, "'{'")?;
        let body = self.block()?;
        self.expect(Token::Return, "'return'")?;
        let retval = self.arith_expr()?;
        self.expect(Token::Semicolon, "';'")?;
        self.expect(Token::RBrace, "'}'")?;

        Ok(FunctionDef {
            name,
            params,
            return_type: Type::Int,
            body,
            retval,
        })
    }

    /// `block := decl* stmt*`
    fn block(&mut self) -> Result<Block, ParseError> {
        let mut decls = vec![];
        while self.peek() == Some(&Token::IntType) {
            self.advance();
            let name = self.identifier()?;
            self.expect(Token::Semicolon, "';'")?;
            decls.push(Declaration { ty: Type::Int, name });
        }

        let mut stmts = vec![];
        loop {
            match self.peek() {
                Some(Token::Id(_)) | Some(Token::If) | Some(Token::While) => {
                    stmts.push(self.statement()?);
                }
                _ => break,
            }
        }

        Ok(Block { decls, stmts })
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Some(Token::Id(_)) => self.assignment(),
            Some(Token::If) => self.conditional(),
            Some(Token::While) => self.loop_stmt(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    /// `assign := id ':=' (call | ae) ';'`
    fn assignment(&mut self) -> Result<Statement, ParseError> {
        let target = self.identifier()?;
        self.expect(Token::Assign, "':='")?;

        // A call is only distinguishable from a variable reference by the
        // parenthesis after the callee name.
        let value = if matches!(self.peek(), Some(Token::Id(_)))
            && self.peek_at(1) == Some(&Token::LParen)
        {
            ArithExpr::Call(self.function_call()?)
        } else {
            self.arith_expr()?
        };
        self.expect(Token::Semicolon, "';'")?;

        Ok(Statement::Assign { target, value })
    }

    /// `call := id '(' ae (',' ae)* ')'`
    fn function_call(&mut self) -> Result<FunctionCall, ParseError> {
        let callee = self.identifier()?;
        self.expect(Token::LParen, "'('")?;

        let mut arguments = vec![];
        while self.peek() != Some(&Token::RParen) {
            if !arguments.is_empty() {
                self.expect(Token::Comma, "','")?;
            }
            arguments.push(self.arith_expr()?);
        }
        self.expect(Token::RParen, "')'")?;

        Ok(FunctionCall { callee, arguments })
    }

    /// `cond := 'if' '(' re ')' '{' block '}' ('else' '{' block '}')?`
    fn conditional(&mut self) -> Result<Statement, ParseError> {
        self.expect(Token::If, "'if'")?;
        self.expect(Token::LParen, "'('")?;
        let guard = self.rel_expr()?;
        self.expect(Token::RParen, "')'")?;

        self.expect(Token::LBrace, "'{'")?;
        let true_branch = self.block()?;
        self.expect(Token::RBrace, "'}'")?;

        let false_branch = if self.recognise(&Token::Else) {
            self.expect(Token::LBrace, "'{'")?;
            let branch = self.block()?;
            self.expect(Token::RBrace, "'}'")?;
            branch
        } else {
            Block::default()
        };

        Ok(Statement::If {
            guard,
            true_branch,
            false_branch,
        })
    }

    /// `loop := 'while' '(' re ')' '{' block '}'`
    fn loop_stmt(&mut self) -> Result<Statement, ParseError> {
        self.expect(Token::While, "'while'")?;
        self.expect(Token::LParen, "'('")?;
        let guard = self.rel_expr()?;
        self.expect(Token::RParen, "')'")?;

        self.expect(Token::LBrace, "'{'")?;
        let body = self.block()?;
        self.expect(Token::RBrace, "'}'")?;

        Ok(Statement::While { guard, body })
    }

    /// `re := rand ('||' rand)*`
    fn rel_expr(&mut self) -> Result<RelExpr, ParseError> {
        let mut lhs = self.rel_and()?;
        while self.recognise(&Token::LogicOp(LogicOp::Or)) {
            let rhs = self.rel_and()?;
            lhs = RelExpr::Logical {
                op: LogicOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// `rand := rnot ('&&' rnot)*`
    fn rel_and(&mut self) -> Result<RelExpr, ParseError> {
        let mut lhs = self.rel_not()?;
        while self.recognise(&Token::LogicOp(LogicOp::And)) {
            let rhs = self.rel_not()?;
            lhs = RelExpr::Logical {
                op: LogicOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// `rnot := '!' rnot | '(' re ')' | ae rop ae`
    ///
    /// A leading parenthesis may open either a nested relational expression
    /// or an arithmetic operand; the relational reading is attempted first
    /// and rolled back on failure.
    fn rel_not(&mut self) -> Result<RelExpr, ParseError> {
        if self.recognise(&Token::Not) {
            return Ok(RelExpr::Not(Box::new(self.rel_not()?)));
        }

        if self.peek() == Some(&Token::LParen) {
            let snapshot = self.position;
            self.advance();
            if let Ok(inner) = self.rel_expr() {
                if self.recognise(&Token::RParen) {
                    return Ok(inner);
                }
            }
            self.position = snapshot;
        }

        self.comparison()
    }

    /// `ae rop ae`
    fn comparison(&mut self) -> Result<RelExpr, ParseError> {
        let lhs = self.arith_expr()?;
        let op = match self.peek() {
            Some(&Token::RelOp(op)) => op,
            _ => return Err(self.unexpected("a relational operator")),
        };
        self.advance();
        let rhs = self.arith_expr()?;
        Ok(RelExpr::Compare { op, lhs, rhs })
    }

    /// `ae := term (('+'|'-') term)*`
    fn arith_expr(&mut self) -> Result<ArithExpr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(&Token::ArithOp(op @ ArithOp::Add))
                | Some(&Token::ArithOp(op @ ArithOp::Sub)) => op,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            lhs = ArithExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// `term := factor ('*' factor)*`
    fn term(&mut self) -> Result<ArithExpr, ParseError> {
        let mut lhs = self.factor()?;
        while self.recognise(&Token::ArithOp(ArithOp::Mul)) {
            let rhs = self.factor()?;
            lhs = ArithExpr::Binary {
                op: ArithOp::Mul,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// `factor := num | id | '(' ae ')'`
    fn factor(&mut self) -> Result<ArithExpr, ParseError> {
        match self.peek() {
            Some(&Token::Num(value)) => {
                self.advance();
                Ok(ArithExpr::Integer(value))
            }
            Some(Token::Id(name)) => {
                let name = name.clone();
                self.advance();
                Ok(ArithExpr::Variable(name))
            }
            Some(&Token::LParen) => {
                self.advance();
                let inner = self.arith_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Id(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consumes the next token if it equals `expected`.
    fn recognise(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, expectation: &str) -> Result<(), ParseError> {
        if self.recognise(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(expectation))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedToken {
                found: found.clone(),
                expected: expected.to_string(),
            },
            None => ParseError::UnexpectedEndOfInput {
                expected: expected.to_string(),
            },
        }
    }
}
