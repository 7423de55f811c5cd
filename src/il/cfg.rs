use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display, Formatter};

use super::{error::StructuralError, tac::*};

/// A maximal straight-line run of instructions: control enters at the
/// first instruction and leaves at the last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    instructions: Vec<Instruction>,
}
impl BasicBlock {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instructions_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.instructions
    }
}

/// The control flow graph of one function. Blocks are kept in listing
/// order, with block 0 the entry block. Successor and predecessor sets
/// are exact transposes of one another.
#[derive(Debug, Clone)]
pub struct Cfg {
    blocks: Vec<BasicBlock>,
    successors: Vec<BTreeSet<usize>>,
    predecessors: Vec<BTreeSet<usize>>,
}
impl Cfg {
    /// Partition a listing into basic blocks and connect them.
    ///
    /// Leaders are the first instruction, every jump target, and every
    /// instruction following a jump. A block ending in an unconditional
    /// jump has its target as sole successor; a conditional jump adds
    /// the fall-through block; any other final instruction falls
    /// through.
    pub fn build(listing: &TacListing) -> Result<Self, StructuralError> {
        if listing.is_empty() {
            return Ok(Self {
                blocks: vec![],
                successors: vec![],
                predecessors: vec![],
            });
        }

        let instructions: Vec<_> = listing.iter_instructions().cloned().collect();

        let mut label_indices = HashMap::new();
        for (index, instruction) in instructions.iter().enumerate() {
            if let Some(label) = instruction.as_label() {
                label_indices.insert(label.clone(), index);
            }
        }
        let resolve = |label: &Label| {
            label_indices
                .get(label)
                .copied()
                .ok_or_else(|| StructuralError::UnresolvedLabel(label.to_string()))
        };

        let mut leaders = BTreeSet::new();
        leaders.insert(0);
        for (index, instruction) in instructions.iter().enumerate() {
            if let Some(target) = instruction.jump_target() {
                leaders.insert(resolve(target)?);
                if index + 1 < instructions.len() {
                    leaders.insert(index + 1);
                }
            }
        }

        let starts: Vec<_> = leaders.into_iter().collect();
        let block_of = |index: usize| match starts.binary_search(&index) {
            Ok(block) => block,
            Err(block) => block - 1,
        };

        let mut blocks = vec![];
        for (number, &start) in starts.iter().enumerate() {
            let end = starts
                .get(number + 1)
                .copied()
                .unwrap_or(instructions.len());
            blocks.push(BasicBlock {
                instructions: instructions[start..end].to_vec(),
            });
        }

        let mut successors = vec![BTreeSet::new(); blocks.len()];
        for (number, block) in blocks.iter().enumerate() {
            // Blocks are never empty: every leader starts one.
            let last = &block.instructions[block.instructions.len() - 1];
            match last {
                Instruction::Jump(target) => {
                    successors[number].insert(block_of(resolve(target)?));
                }
                Instruction::JumpIfZero { target, .. } => {
                    successors[number].insert(block_of(resolve(target)?));
                    if number + 1 < blocks.len() {
                        successors[number].insert(number + 1);
                    }
                }
                _ => {
                    if number + 1 < blocks.len() {
                        successors[number].insert(number + 1);
                    }
                }
            }
        }

        let mut predecessors = vec![BTreeSet::new(); blocks.len()];
        for (number, targets) in successors.iter().enumerate() {
            for &target in targets {
                predecessors[target].insert(number);
            }
        }

        let cfg = Self {
            blocks,
            successors,
            predecessors,
        };
        cfg.validate_edges()?;
        Ok(cfg)
    }

    /// Check that every edge endpoint names an existing block and that
    /// the successor and predecessor sets mirror each other.
    pub fn validate_edges(&self) -> Result<(), StructuralError> {
        for (block, targets) in self.successors.iter().enumerate() {
            for &target in targets {
                if target >= self.blocks.len() || !self.predecessors[target].contains(&block) {
                    return Err(StructuralError::DanglingEdge { block, target });
                }
            }
        }
        for (block, sources) in self.predecessors.iter().enumerate() {
            for &source in sources {
                if source >= self.blocks.len() || !self.successors[source].contains(&block) {
                    return Err(StructuralError::DanglingEdge {
                        block: source,
                        target: block,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, number: usize) -> &BasicBlock {
        &self.blocks[number]
    }

    pub fn block_mut(&mut self, number: usize) -> &mut BasicBlock {
        &mut self.blocks[number]
    }

    pub fn successors(&self, number: usize) -> &BTreeSet<usize> {
        &self.successors[number]
    }

    pub fn predecessors(&self, number: usize) -> &BTreeSet<usize> {
        &self.predecessors[number]
    }
}
impl Display for Cfg {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (number, block) in self.blocks.iter().enumerate() {
            writeln!(f, " block {}:", number)?;
            for instruction in &block.instructions {
                writeln!(f, "  {}", instruction)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::il::generator::generate;
    use crate::{lexer::lex, parser::parse};

    use super::*;

    fn build_cfg(source: &str) -> Cfg {
        let tokens = lex(source).unwrap();
        let program = parse(&tokens).unwrap();
        let tac = generate(&program).unwrap();
        Cfg::build(tac.listing(TOP_LEVEL_FUNCTION).unwrap()).unwrap()
    }

    fn successor_sets(cfg: &Cfg) -> Vec<Vec<usize>> {
        (0..cfg.len())
            .map(|b| cfg.successors(b).iter().copied().collect())
            .collect()
    }

    #[test]
    fn straight_line_code_forms_one_block() {
        let cfg = build_cfg("int x; x := 1 + 2; output x;");

        assert_eq!(1, cfg.len());
        assert_eq!(3, cfg.block(0).instructions().len());
        assert!(cfg.successors(0).is_empty());
        assert!(cfg.predecessors(0).is_empty());
    }

    #[test]
    fn conditional_forms_a_diamond() {
        let cfg = build_cfg("if (1 < 2) { } output 4;");

        assert_eq!(4, cfg.len());
        assert_eq!(
            vec![vec![1, 2], vec![3], vec![3], vec![]],
            successor_sets(&cfg)
        );
    }

    #[test]
    fn loop_forms_a_back_edge() {
        let cfg = build_cfg("while (1 < 2) { } output 4;");

        assert_eq!(3, cfg.len());
        assert_eq!(vec![vec![1, 2], vec![0], vec![]], successor_sets(&cfg));
        assert!(cfg.predecessors(0).contains(&1));
    }

    #[test]
    fn partition_covers_every_instruction_once() {
        let source = "int x; x := 0; while (x < 10) { if (x < 5) { x := x + 1; } x := x + 2; } output x;";
        let tokens = lex(source).unwrap();
        let program = parse(&tokens).unwrap();
        let tac = generate(&program).unwrap();
        let listing = tac.listing(TOP_LEVEL_FUNCTION).unwrap();
        let cfg = Cfg::build(listing).unwrap();

        let total: usize = cfg.blocks().iter().map(|b| b.instructions().len()).sum();
        assert_eq!(listing.len(), total);

        let flattened: Vec<_> = cfg
            .blocks()
            .iter()
            .flat_map(|b| b.instructions().iter().cloned())
            .collect();
        let original: Vec<_> = listing.iter_instructions().cloned().collect();
        assert_eq!(original, flattened);
    }

    #[test]
    fn edges_are_mutual_transposes() {
        let cfg = build_cfg(
            "int x; x := 0; while (x < 10) { if (x < 5) { x := x + 1; } x := x + 2; } output x;",
        );

        for block in 0..cfg.len() {
            for &succ in cfg.successors(block) {
                assert!(cfg.predecessors(succ).contains(&block));
            }
            for &pred in cfg.predecessors(block) {
                assert!(cfg.successors(pred).contains(&block));
            }
        }
        assert!(cfg.validate_edges().is_ok());
    }

    #[test]
    fn empty_listing_builds_an_empty_graph() {
        let cfg = Cfg::build(&TacListing::new()).unwrap();
        assert!(cfg.is_empty());
    }

    #[test]
    fn jump_to_unknown_label_is_rejected() {
        let mut listing = TacListing::new();
        listing.push(Instruction::Jump(Label::new("IF_END", 7)));

        let error = Cfg::build(&listing).unwrap_err();
        assert_eq!(StructuralError::UnresolvedLabel("IF_END_7".to_string()), error);
    }
}
