//! The L1 program tree.
//!
//! The grammar of the abstract syntax is:
//! ```text
//! ae   ::= n | id | ae1 aop ae2          aop ::= + | - | *
//! re   ::= ae1 rop ae2 | re1 lop re2 | !re
//! rop  ::= < | <= | =                    lop ::= && | ||
//! stmt ::= assign | cond | loop
//! prog ::= fundef... block ae
//! ```
//! Every node kind is a closed sum type, so the middle end dispatches on
//! them with exhaustive matches rather than double dispatch.

use std::fmt::{self, Display, Formatter};

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}
impl Display for ArithOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
        })
    }
}

/// A binary relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Lt,
    Le,
    Eq,
}
impl Display for RelOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
        })
    }
}

/// A binary logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
}
impl Display for LogicOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::And => "&&",
            Self::Or => "||",
        })
    }
}

/// An arithmetic expression. A call node may only appear as the full
/// right-hand side of an assignment; the generator rejects one used as
/// a plain value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArithExpr {
    Integer(i32),
    Variable(String),
    Binary {
        op: ArithOp,
        lhs: Box<ArithExpr>,
        rhs: Box<ArithExpr>,
    },
    Call(FunctionCall),
}

/// A relational expression, used as the guard of conditionals and loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelExpr {
    Compare {
        op: RelOp,
        lhs: ArithExpr,
        rhs: ArithExpr,
    },
    Logical {
        op: LogicOp,
        lhs: Box<RelExpr>,
        rhs: Box<RelExpr>,
    },
    Not(Box<RelExpr>),
}

/// A function call: `id(ae, ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub callee: String,
    pub arguments: Vec<ArithExpr>,
}

/// The single type of L1. Declarations carry it but it produces no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
}

/// A variable declaration: `int id;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Assign {
        target: String,
        value: ArithExpr,
    },
    If {
        guard: RelExpr,
        true_branch: Block,
        false_branch: Block,
    },
    While {
        guard: RelExpr,
        body: Block,
    },
}

/// A sequence of declarations followed by statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub decls: Vec<Declaration>,
    pub stmts: Vec<Statement>,
}

/// A function definition: `def id(params) : int { block return ae; }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<(Type, String)>,
    pub return_type: Type,
    pub body: Block,
    pub retval: ArithExpr,
}

/// A whole program: function definitions, a top-level block, and the
/// final arithmetic expression whose value the program outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
    pub top_level: Block,
    pub result: ArithExpr,
}
