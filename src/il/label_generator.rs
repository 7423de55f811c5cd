use super::Label;

/// Produces jump labels. Both labels of one control-flow construct share
/// a numeric suffix taken from a single counter, so label names are
/// unique within a generation run.
pub struct LabelGenerator {
    next_index: usize,
}
impl LabelGenerator {
    pub fn new() -> Self {
        Self { next_index: 0 }
    }

    /// Generates the label pair for one conditional or loop.
    pub fn next_pair(&mut self, first: &str, second: &str) -> (Label, Label) {
        let index = self.next_index;
        self.next_index += 1;

        (Label::new(first, index), Label::new(second, index))
    }
}
