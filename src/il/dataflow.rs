use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use fixedbitset::FixedBitSet;
use log::debug;

use super::{cfg::Cfg, tac::*};

/// The identity of a binary expression: its operator and both operands
/// in source order. Operators are treated as non-commutative, so
/// `a ADD b` and `b ADD a` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExprKey {
    pub op: Opcode,
    pub lhs: Operand,
    pub rhs: Operand,
}
impl ExprKey {
    pub fn new(op: Opcode, lhs: Operand, rhs: Operand) -> Self {
        Self { op, lhs, rhs }
    }

    /// The key of a binary instruction, if it is one.
    pub fn of(instruction: &Instruction) -> Option<Self> {
        instruction
            .as_binary()
            .map(|(_, op, lhs, rhs)| Self::new(op, lhs.clone(), rhs.clone()))
    }

    /// Whether either operand is a variable with the given name.
    pub fn reads(&self, name: &str) -> bool {
        self.lhs.var_name() == Some(name) || self.rhs.var_name() == Some(name)
    }
}
impl Display for ExprKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

/// All distinct binary expressions of one function, numbered in order
/// of first occurrence. The numbering fixes the bit position of each
/// expression in every bit vector of the analysis.
#[derive(Debug, Default)]
pub struct ExprUniverse {
    keys: Vec<ExprKey>,
    indices: HashMap<ExprKey, usize>,
}
impl ExprUniverse {
    pub fn collect(cfg: &Cfg) -> Self {
        let mut universe = Self::default();
        for block in cfg.blocks() {
            for instruction in block.instructions() {
                if let Some(key) = ExprKey::of(instruction) {
                    universe.intern(key);
                }
            }
        }
        universe
    }

    fn intern(&mut self, key: ExprKey) -> usize {
        if let Some(&index) = self.indices.get(&key) {
            return index;
        }
        let index = self.keys.len();
        self.indices.insert(key.clone(), index);
        self.keys.push(key);
        index
    }

    pub fn index(&self, key: &ExprKey) -> Option<usize> {
        self.indices.get(key).copied()
    }

    pub fn key(&self, index: usize) -> &ExprKey {
        &self.keys[index]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExprKey> {
        self.keys.iter()
    }
}

/// The local transfer sets of one block. `gen` holds the expressions
/// computed in the block whose operands survive to its end; `kill`
/// holds every expression invalidated by a definition in the block.
#[derive(Debug)]
struct GenKill {
    gen: FixedBitSet,
    kill: FixedBitSet,
}
impl GenKill {
    fn compute(universe: &ExprUniverse, instructions: &[Instruction]) -> Self {
        let mut gen = FixedBitSet::with_capacity(universe.len());
        let mut kill = FixedBitSet::with_capacity(universe.len());

        for instruction in instructions {
            if let Some(name) = instruction.defined_name() {
                for (index, key) in universe.iter().enumerate() {
                    if key.reads(name) {
                        kill.insert(index);
                        gen.set(index, false);
                    }
                }
            }
            if let Some(key) = ExprKey::of(instruction) {
                let self_referential = instruction
                    .defined_name()
                    .map(|name| key.reads(name))
                    .unwrap_or(false);
                if !self_referential {
                    if let Some(index) = universe.index(&key) {
                        gen.insert(index);
                    }
                }
            }
        }

        Self { gen, kill }
    }

    /// Apply the block's transfer function: `out = gen ∪ (in − kill)`.
    fn transfer(&self, entry: &FixedBitSet) -> FixedBitSet {
        let mut exit = entry.clone();
        exit.difference_with(&self.kill);
        exit.union_with(&self.gen);
        exit
    }
}

/// The available-expressions solution of one function: for every block,
/// the set of expressions guaranteed to have been computed, with their
/// operands unchanged since, on every path reaching it.
#[derive(Debug)]
pub struct Analysis {
    universe: ExprUniverse,
    entry: Vec<FixedBitSet>,
    exit: Vec<FixedBitSet>,
}
impl Analysis {
    pub fn universe(&self) -> &ExprUniverse {
        &self.universe
    }

    /// The expressions available on entry to a block.
    pub fn entry(&self, block: usize) -> &FixedBitSet {
        &self.entry[block]
    }

    /// The expressions available on exit from a block.
    pub fn exit(&self, block: usize) -> &FixedBitSet {
        &self.exit[block]
    }
}

/// Solve available expressions over a control flow graph.
///
/// This is a forward must-analysis: block entry sets meet their
/// predecessors' exit sets by intersection. The entry block starts from
/// the empty set and stays pinned there; all other sets start full and
/// only ever shrink, so the iteration reaches a fixed point within
/// `blocks × expressions` passes.
pub fn analyse(cfg: &Cfg) -> Analysis {
    let universe = ExprUniverse::collect(cfg);
    let transfers: Vec<_> = cfg
        .blocks()
        .iter()
        .map(|block| GenKill::compute(&universe, block.instructions()))
        .collect();

    let mut full = FixedBitSet::with_capacity(universe.len());
    full.set_range(.., true);

    let mut entry = vec![full.clone(); cfg.len()];
    let mut exit = vec![full.clone(); cfg.len()];
    if !cfg.is_empty() {
        entry[0] = FixedBitSet::with_capacity(universe.len());
        exit[0] = transfers[0].transfer(&entry[0]);
    }

    let bound = cfg.len() * universe.len() + 1;
    for pass in 0..bound {
        let mut changed = false;
        for block in 1..cfg.len() {
            // A block with no predecessors keeps the conservative full
            // set; only the entry block is known to be reached with
            // nothing available.
            let mut meet = full.clone();
            for &pred in cfg.predecessors(block) {
                meet.intersect_with(&exit[pred]);
            }
            let out = transfers[block].transfer(&meet);
            if meet != entry[block] || out != exit[block] {
                entry[block] = meet;
                exit[block] = out;
                changed = true;
            }
        }
        if !changed {
            debug!("available expressions converged after {} pass(es)", pass + 1);
            break;
        }
    }

    Analysis {
        universe,
        entry,
        exit,
    }
}
