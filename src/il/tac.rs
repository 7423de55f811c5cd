//! Three-Address Code

use std::fmt::{self, Display, Formatter};

use crate::{
    ast::{ArithOp, LogicOp, RelOp},
    listing::Listing,
};

pub type TacListing = Listing<Instruction>;

/// The reserved function name under which the top-level statement block
/// and the final output expression are grouped.
pub const TOP_LEVEL_FUNCTION: &str = "global";

/// A TAC operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Not,
    Call,
    Add,
    Sub,
    Mul,
    Lt,
    Le,
    Eq,
    And,
    Or,
}
impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Not => "!",
            Self::Call => "CALL",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Eq => "EQ",
            Self::And => "AND",
            Self::Or => "OR",
        })
    }
}
impl From<ArithOp> for Opcode {
    fn from(op: ArithOp) -> Self {
        match op {
            ArithOp::Add => Self::Add,
            ArithOp::Sub => Self::Sub,
            ArithOp::Mul => Self::Mul,
        }
    }
}
impl From<RelOp> for Opcode {
    fn from(op: RelOp) -> Self {
        match op {
            RelOp::Lt => Self::Lt,
            RelOp::Le => Self::Le,
            RelOp::Eq => Self::Eq,
        }
    }
}
impl From<LogicOp> for Opcode {
    fn from(op: LogicOp) -> Self {
        match op {
            LogicOp::And => Self::And,
            LogicOp::Or => Self::Or,
        }
    }
}

/// A TAC operand. Operands are immutable once constructed; their textual
/// rendering doubles as the canonical signature used by the dataflow
/// engine's expression keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// An integer constant.
    Const(i32),
    /// A source variable or a generated temporary.
    Var(String),
    /// A reference to a function, as produced by lowering a call. Only
    /// valid as the callee of a [`Instruction::Call`].
    Function(String),
}
impl Operand {
    /// The variable name this operand binds, if it is a variable.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            _ => None,
        }
    }
}
impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{}", value),
            Self::Var(name) => f.write_str(name),
            Self::Function(name) => f.write_str(name),
        }
    }
}

/// A jump target or label marker, rendered as `{name}_{subscript}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    name: String,
    subscript: usize,
}
impl Label {
    pub fn new<S: Into<String>>(name: S, subscript: usize) -> Self {
        Self {
            name: name.into(),
            subscript,
        }
    }
}
impl Display for Label {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.subscript)
    }
}

/// A single TAC instruction. The implicit `<-` moves a value into the
/// destination; only copies, unary and binary operations, and calls have
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Copy a value into a destination: `dst <- src`.
    Copy { dst: Operand, src: Operand },
    /// Apply a unary operator: `dst <- ! src`.
    Unary {
        dst: Operand,
        op: Opcode,
        src: Operand,
    },
    /// Apply a binary operator: `dst <- lhs OP rhs`.
    Binary {
        dst: Operand,
        op: Opcode,
        lhs: Operand,
        rhs: Operand,
    },
    /// Call a function whose arguments were pushed by [`Instruction::Arg`].
    Call { dst: Operand, callee: Operand },
    /// Push an argument for an upcoming call.
    Arg(Operand),
    /// Return a value from a function body.
    Return(Operand),
    /// Output the final value of the program.
    Output(Operand),
    /// Jump to a label unconditionally.
    Jump(Label),
    /// Jump to a label if the condition evaluates to zero.
    JumpIfZero { cond: Operand, target: Label },
    /// A label marker which can be jumped to.
    Label(Label),
}
impl Instruction {
    /// The destination operand this instruction writes, if any.
    pub fn dest(&self) -> Option<&Operand> {
        match self {
            Self::Copy { dst, .. } => Some(dst),
            Self::Unary { dst, .. } => Some(dst),
            Self::Binary { dst, .. } => Some(dst),
            Self::Call { dst, .. } => Some(dst),
            _ => None,
        }
    }

    /// The variable name this instruction defines, if any.
    pub fn defined_name(&self) -> Option<&str> {
        self.dest().and_then(Operand::var_name)
    }

    /// The label this instruction transfers control to, if it is a jump.
    pub fn jump_target(&self) -> Option<&Label> {
        match self {
            Self::Jump(target) => Some(target),
            Self::JumpIfZero { target, .. } => Some(target),
            _ => None,
        }
    }

    /// The label this instruction marks, if it is a label marker.
    pub fn as_label(&self) -> Option<&Label> {
        match self {
            Self::Label(label) => Some(label),
            _ => None,
        }
    }

    /// The destination, operator and source operands of a binary
    /// operation.
    pub fn as_binary(&self) -> Option<(&Operand, Opcode, &Operand, &Operand)> {
        match self {
            Self::Binary { dst, op, lhs, rhs } => Some((dst, *op, lhs, rhs)),
            _ => None,
        }
    }
}
impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Copy { dst, src } => write!(f, "{} <- {}", dst, src),
            Self::Unary { dst, op, src } => write!(f, "{} <- {} {}", dst, op, src),
            Self::Binary { dst, op, lhs, rhs } => {
                write!(f, "{} <- {} {} {}", dst, lhs, op, rhs)
            }
            Self::Call { dst, callee } => write!(f, "{} <- CALL {}", dst, callee),
            Self::Arg(value) => write!(f, "arg {}", value),
            Self::Return(value) => write!(f, "return {}", value),
            Self::Output(value) => write!(f, "output {}", value),
            Self::Jump(target) => write!(f, "jump {}", target),
            Self::JumpIfZero { cond, target } => {
                write!(f, "jump_if_0 {} {}", cond, target)
            }
            Self::Label(label) => write!(f, "{}:", label),
        }
    }
}

/// The generated instruction listings of one program, keyed by function
/// name in declaration order, with the top-level code last under
/// [`TOP_LEVEL_FUNCTION`].
#[derive(Debug, Default)]
pub struct TacProgram {
    pub functions: Vec<(String, TacListing)>,
}
impl TacProgram {
    pub fn new() -> Self {
        Self { functions: vec![] }
    }

    pub fn listing(&self, name: &str) -> Option<&TacListing> {
        self.functions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, listing)| listing)
    }
}
impl Display for TacProgram {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (name, body) in self.functions.iter() {
            writeln!(f, "function {}", name)?;
            for instr in body.iter_instructions() {
                if let Instruction::Label(_) = instr {
                    writeln!(f, "    {}", instr)?;
                } else {
                    writeln!(f, "        {}", instr)?;
                }
            }
        }

        Ok(())
    }
}
