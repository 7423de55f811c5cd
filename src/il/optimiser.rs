use std::collections::HashMap;

use super::{
    cfg::Cfg,
    dataflow::{Analysis, ExprKey},
    tac::*,
};

/// Eliminate redundant binary computations using the available
/// expressions solution, producing a rewritten copy of the graph.
///
/// Within a block, a recomputation of an expression whose value is
/// still held by an earlier destination becomes a copy from that
/// destination. An expression available on block entry is reused only
/// when exactly one computing site exists outside the block: its
/// destination is then the unique holder of the value on every path in,
/// so copying from it is sound. Expressions computed at several outside
/// sites (one per branch of a diamond, say) are left alone, since no
/// single name is known to hold the value at the join.
pub fn optimise(cfg: &Cfg, analysis: &Analysis) -> Cfg {
    let sites = collect_sites(cfg);
    let mut optimised = cfg.clone();

    for block in 0..optimised.len() {
        let mut computed = seed_holders(block, analysis, &sites);

        for instruction in optimised.block_mut(block).instructions_mut() {
            let key = ExprKey::of(instruction).and_then(|k| analysis.universe().index(&k));

            if let Some(index) = key {
                if let Some(holder) = computed.get(&index) {
                    let dst = match instruction.dest() {
                        Some(dst) => dst.clone(),
                        None => continue,
                    };
                    *instruction = Instruction::Copy {
                        dst,
                        src: holder.clone(),
                    };
                }
            }

            if let Some(name) = instruction.defined_name().map(str::to_string) {
                computed.retain(|&index, holder| {
                    !analysis.universe().key(index).reads(&name)
                        && holder.var_name() != Some(name.as_str())
                });
            }

            if let Some(index) = key {
                if let Instruction::Binary { dst, .. } = instruction {
                    let self_referential = dst
                        .var_name()
                        .map(|name| analysis.universe().key(index).reads(name))
                        .unwrap_or(false);
                    if !self_referential {
                        computed.insert(index, dst.clone());
                    }
                }
            }
        }
    }

    optimised
}

/// Every computing site of every binary expression, as the block it
/// sits in and the destination that holds its value afterwards.
/// Self-referential computations hold nothing and are skipped.
fn collect_sites(cfg: &Cfg) -> HashMap<ExprKey, Vec<(usize, Operand)>> {
    let mut sites: HashMap<ExprKey, Vec<(usize, Operand)>> = HashMap::new();
    for (block, contents) in cfg.blocks().iter().enumerate() {
        for instruction in contents.instructions() {
            if let (Some(key), Some(dst)) = (ExprKey::of(instruction), instruction.dest()) {
                let self_referential = dst.var_name().map(|n| key.reads(n)).unwrap_or(false);
                if !self_referential {
                    sites.entry(key).or_default().push((block, dst.clone()));
                }
            }
        }
    }
    sites
}

/// The holders a block may copy from before computing anything itself:
/// every expression available on entry with a single outside site.
fn seed_holders(
    block: usize,
    analysis: &Analysis,
    sites: &HashMap<ExprKey, Vec<(usize, Operand)>>,
) -> HashMap<usize, Operand> {
    let mut holders = HashMap::new();
    for index in analysis.entry(block).ones() {
        let key = analysis.universe().key(index);
        let outside: Vec<_> = sites
            .get(key)
            .into_iter()
            .flatten()
            .filter(|(site, _)| *site != block)
            .collect();
        if let [(_, holder)] = outside[..] {
            holders.insert(index, holder.clone());
        }
    }
    holders
}

#[cfg(test)]
mod tests {
    use crate::il::{dataflow::analyse, generator::generate};
    use crate::{lexer::lex, parser::parse};

    use super::*;

    fn optimise_source(source: &str) -> (Cfg, Cfg) {
        let tokens = lex(source).unwrap();
        let program = parse(&tokens).unwrap();
        let tac = generate(&program).unwrap();
        let cfg = Cfg::build(tac.listing(TOP_LEVEL_FUNCTION).unwrap()).unwrap();
        let analysis = analyse(&cfg);
        let optimised = optimise(&cfg, &analysis);
        (cfg, optimised)
    }

    fn block_lines(cfg: &Cfg, block: usize) -> Vec<String> {
        cfg.block(block)
            .instructions()
            .iter()
            .map(|i| i.to_string())
            .collect()
    }

    #[test]
    fn recomputation_in_a_block_becomes_a_copy() {
        let (_, optimised) =
            optimise_source("int a; int b; int x; x := 1; a := x + 2; b := x + 2; output b;");

        assert_eq!(
            vec![
                "x <- 1",
                "_tmp0 <- x ADD 2",
                "a <- _tmp0",
                "_tmp1 <- _tmp0",
                "b <- _tmp1",
                "output b",
            ],
            block_lines(&optimised, 0)
        );
    }

    #[test]
    fn redefined_operand_blocks_reuse() {
        let (original, optimised) = optimise_source(
            "int a; int b; int x; x := 1; a := x + 2; x := 3; b := x + 2; output b;",
        );

        assert_eq!(block_lines(&original, 0), block_lines(&optimised, 0));
    }

    #[test]
    fn available_expression_with_one_outside_site_is_reused() {
        let (_, optimised) = optimise_source(
            "int x; int a; int b; x := 1; a := x + 1; \
             if (x < 2) { b := x + 1; } output a;",
        );

        assert_eq!(
            vec!["_tmp2 <- _tmp0", "b <- _tmp2", "jump IF_END_0"],
            block_lines(&optimised, 1)
        );
    }

    #[test]
    fn join_of_two_computing_arms_is_left_alone() {
        let (original, optimised) = optimise_source(
            "int x; int a; int b; x := 1; \
             if (x < 2) { a := x + 1; } else { a := x + 1; } \
             b := x + 1; output b;",
        );

        // Both arms compute `x ADD 1` into different temporaries, so no
        // single holder reaches the join.
        assert_eq!(block_lines(&original, 3), block_lines(&optimised, 3));
        assert!(block_lines(&optimised, 3)
            .iter()
            .any(|line| line == "_tmp3 <- x ADD 1"));
    }

    #[test]
    fn rewriting_preserves_instruction_count_and_edges() {
        let (original, optimised) = optimise_source(
            "int x; int a; int b; x := 1; a := x + 1; \
             if (x < 2) { b := x + 1; } output a;",
        );

        for block in 0..original.len() {
            assert_eq!(
                original.block(block).instructions().len(),
                optimised.block(block).instructions().len()
            );
            assert_eq!(original.successors(block), optimised.successors(block));
            assert_eq!(original.predecessors(block), optimised.predecessors(block));
        }
    }

    #[test]
    fn expression_killed_in_a_loop_is_not_reused_after_it() {
        let (original, optimised) = optimise_source(
            "int x; int y; int z; x := 0; y := x + 1; \
             while (x < 10) { x := x + 1; } z := x + 1; output z;",
        );

        let last = original.len() - 1;
        assert_eq!(block_lines(&original, last), block_lines(&optimised, last));
    }
}
