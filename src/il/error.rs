use thiserror::Error;

/// An error raised while lowering a program tree to TAC. These indicate a
/// malformed tree; nothing is emitted for the offending function.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("a call to '{0}' cannot be used as a plain value")]
    CallAsValue(String),
}

/// An error raised while partitioning a function into basic blocks, or
/// when a malformed CFG is handed to the dataflow engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("jump to unresolved label '{0}'")]
    UnresolvedLabel(String),
    #[error("block {block} references non-existent successor {target}")]
    DanglingEdge { block: usize, target: usize },
}

/// Any middle-end failure for one function. Failures are isolated: one
/// function failing does not stop the others from being processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MidendError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Structural(#[from] StructuralError),
}
