use super::Operand;

const TMP_PREFIX: &str = "_tmp";

/// Produces the fresh temporaries that hold intermediate results. The
/// counter is monotonically increasing over one generation run, so every
/// temporary is assigned exactly once.
pub struct NameGenerator {
    next_index: usize,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self { next_index: 0 }
    }

    /// Generates a new unique temporary variable.
    pub fn next_temp(&mut self) -> Operand {
        let name = format!("{}{}", TMP_PREFIX, self.next_index);
        self.next_index += 1;
        Operand::Var(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_temp_generates_ascending_temp_values() {
        let mut name_gen = NameGenerator::new();

        assert_eq!("_tmp0", name_gen.next_temp().to_string());
        assert_eq!("_tmp1", name_gen.next_temp().to_string());
        assert_eq!("_tmp2", name_gen.next_temp().to_string());
    }
}
