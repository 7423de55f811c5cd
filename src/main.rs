use std::fmt::Write as _;
use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use commandline::Options;
use error::PositionalError;
use il::{FunctionIr, MidendError};

mod ast;
mod commandline;
mod error;
mod il;
mod lexer;
mod listing;
mod parser;

fn main() -> Result<()> {
    let options = Options::parse();

    stderrlog::new()
        .verbosity(options.verbose)
        .module(module_path!())
        .init()?;

    let source = fs::read_to_string(&options.file)
        .with_context(|| format!("could not read '{}'", options.file.display()))?;

    info!("lexing '{}'", options.file.display());
    let tokens = match lexer::lex(&source) {
        Ok(tokens) => tokens,
        Err(error) => {
            describe_error(&error, &source);
            bail!("could not tokenize the program");
        }
    };

    info!("parsing {} tokens", tokens.len());
    let program = parser::parse(&tokens).context("could not parse the program")?;

    info!(
        "processing {} function(s) and the top-level block",
        program.functions.len()
    );
    let results = il::process(&program, options.optimise());
    let report = render_report(&results)?;

    match &options.output {
        Some(path) => fs::write(path, report)
            .with_context(|| format!("could not write '{}'", path.display()))?,
        None => print!("{}", report),
    }

    Ok(())
}

/// Renders the middle end's results: per function, the expression
/// legend, the fixed point solution as per-block `in:`/`out:` bit rows,
/// and the final instructions block by block.
fn render_report(results: &[(String, Result<FunctionIr, MidendError>)]) -> Result<String> {
    let mut report = String::new();
    for (name, result) in results {
        writeln!(report, "function: {}", name)?;
        match result {
            Ok(ir) => render_function(&mut report, ir)?,
            Err(error) => writeln!(report, "error: {}", error)?,
        }
        writeln!(report)?;
    }
    Ok(report)
}

fn render_function(report: &mut String, ir: &FunctionIr) -> Result<()> {
    let universe = ir.analysis.universe();

    writeln!(report, "expressions:")?;
    for (index, key) in universe.iter().enumerate() {
        writeln!(report, "  {}: {}", index, key)?;
    }

    writeln!(report, "\t\tFIXED POINT SOLUTION")?;
    for block in 0..ir.cfg.len() {
        writeln!(report, "block: {}", block)?;
        writeln!(report, "in: {}", bit_row(ir.analysis.entry(block), universe.len()))?;
        writeln!(report, "out: {}", bit_row(ir.analysis.exit(block), universe.len()))?;
    }

    writeln!(report, "\t\tOPTIMIZED PROGRAM")?;
    write!(report, "{}", ir.cfg)?;
    Ok(())
}

fn bit_row(set: &fixedbitset::FixedBitSet, width: usize) -> String {
    (0..width)
        .map(|index| if set.contains(index) { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prints a caret diagnostic pointing at the offending character.
fn describe_error(error: &impl PositionalError, source: &str) {
    let (line_no, line_start, line) = find_line(source, error.position());
    let padding = error.position() - line_start;

    let gutter = line_no.to_string();
    eprintln!("{}| {}", gutter, line);
    eprintln!(
        "{}| {}^--- {}",
        " ".repeat(gutter.len()),
        " ".repeat(padding),
        error.describe()
    );
}

/// Locates the line containing a byte offset, returning its one-based
/// number, its starting offset, and its text. Offsets past the end map
/// to the last line.
fn find_line(source: &str, target: usize) -> (usize, usize, &str) {
    let mut position = 0;
    let mut line_info = (1, 0, "");
    for (index, line) in source.split_inclusive(['\n', '\r']).enumerate() {
        let end = position + line.len();
        line_info = (index + 1, position, line.trim_end());
        if target < end {
            break;
        }
        position = end;
    }
    line_info
}
