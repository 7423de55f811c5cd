use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(about = "An optimising middle end for L1 programs")]
pub struct Options {
    /// The L1 source file to process
    pub file: PathBuf,
    /// Write the report here instead of standard output
    #[clap(short, long)]
    pub output: Option<PathBuf>,
    /// Do not eliminate common subexpressions
    #[clap(long)]
    no_optimise: bool,
    #[clap(short, long, default_value_t = 1)]
    pub verbose: usize,
}

impl Options {
    pub fn optimise(&self) -> bool {
        !self.no_optimise
    }
}
