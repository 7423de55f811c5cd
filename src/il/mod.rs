//! The middle end: lowers program trees to three-address code, builds
//! control flow graphs, solves available expressions over them, and
//! optionally eliminates common subexpressions.
mod cfg;
mod dataflow;
mod error;
mod generator;
mod label_generator;
mod name_generator;
mod optimiser;
mod tac;

pub use cfg::{BasicBlock, Cfg};
pub use dataflow::{analyse, Analysis, ExprKey, ExprUniverse};
pub use error::{GenerationError, MidendError, StructuralError};
pub use generator::{generate, TacGenerator};
pub use optimiser::optimise;
pub use tac::{Instruction, Label, Opcode, Operand, TacListing, TacProgram, TOP_LEVEL_FUNCTION};

use log::debug;

use crate::ast::Program;

/// The processed form of one function: its control flow graph and the
/// available expressions solution computed over it. When optimisation
/// is on, the graph holds the rewritten instructions; the solution
/// always describes the graph as it was analysed.
pub struct FunctionIr {
    pub cfg: Cfg,
    pub analysis: Analysis,
}

/// Run the middle end over a whole program, function by function, with
/// the top-level code last under [`TOP_LEVEL_FUNCTION`]. A failure in
/// one function is recorded in its slot and does not disturb the
/// others.
pub fn process(program: &Program, optimise_flag: bool) -> Vec<(String, Result<FunctionIr, MidendError>)> {
    let mut generator = TacGenerator::new();
    let mut results = vec![];

    for def in &program.functions {
        let listing = generator.lower_function(def).map_err(MidendError::from);
        results.push((def.name.clone(), listing));
    }
    let top_level = generator
        .lower_top_level(&program.top_level, &program.result)
        .map_err(MidendError::from);
    results.push((TOP_LEVEL_FUNCTION.to_string(), top_level));

    results
        .into_iter()
        .map(|(name, listing)| {
            let ir = listing.and_then(|listing| {
                debug!("processing function '{}' ({} instructions)", name, listing.len());
                process_function(&listing, optimise_flag)
            });
            (name, ir)
        })
        .collect()
}

fn process_function(listing: &TacListing, optimise_flag: bool) -> Result<FunctionIr, MidendError> {
    let mut cfg = Cfg::build(listing)?;
    let analysis = analyse(&cfg);
    if optimise_flag {
        cfg = optimise(&cfg, &analysis);
    }
    Ok(FunctionIr { cfg, analysis })
}

#[cfg(test)]
mod tests {
    use crate::{lexer::lex, parser::parse};

    use super::*;

    fn process_source(source: &str, optimise_flag: bool) -> Vec<(String, Result<FunctionIr, MidendError>)> {
        let tokens = lex(source).unwrap();
        let program = parse(&tokens).unwrap();
        process(&program, optimise_flag)
    }

    #[test]
    fn top_level_code_is_processed_last() {
        let results = process_source(
            "def one() : int { return 1; } int x; x := one(); output x;",
            true,
        );

        let names: Vec<_> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(vec!["one", TOP_LEVEL_FUNCTION], names);
        assert!(results.iter().all(|(_, ir)| ir.is_ok()));
    }

    #[test]
    fn optimisation_can_be_switched_off() {
        let source = "int a; int b; int x; x := 1; a := x + 2; b := x + 2; output b;";

        let plain = process_source(source, false);
        let (_, ir) = &plain[0];
        let lines: Vec<_> = ir
            .as_ref()
            .unwrap()
            .cfg
            .block(0)
            .instructions()
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert!(lines.contains(&"_tmp1 <- x ADD 2".to_string()));

        let optimised = process_source(source, true);
        let (_, ir) = &optimised[0];
        let lines: Vec<_> = ir
            .as_ref()
            .unwrap()
            .cfg
            .block(0)
            .instructions()
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert!(lines.contains(&"_tmp1 <- _tmp0".to_string()));
    }
}
