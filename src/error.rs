/// Implemented by errors that point at a position in the source text,
/// so the driver can render a caret diagnostic for them.
pub trait PositionalError {
    /// The byte offset of the offending character in the source.
    fn position(&self) -> usize;
    /// A human-readable description of the error.
    fn describe(&self) -> String;
}
