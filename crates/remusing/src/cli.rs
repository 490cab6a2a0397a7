//! Command-line front end.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use crate::app::pipeline::UsingRemover;
use crate::domain::errors::UsageError;
use crate::infra::config::Config;
use crate::infra::fs::{Input, Output};
use crate::infra::grammar::{Grammar, GrammarOptions, build_grammar};

/// Remove and refactor `using` declarations in C++ files.
#[derive(Debug, Parser)]
#[command(name = "remusing", author, version, about, long_about = None)]
pub struct Cli {
    /// C++ file input (default: stdin; `-` reads stdin explicitly)
    pub infile: Option<PathBuf>,

    /// Refactored C++ file output (default: stdout)
    pub outfile: Option<PathBuf>,

    /// Overwrite the input file with the changes
    #[arg(short = 'i', long)]
    pub in_place: bool,

    /// Tree-sitter C++ grammar source directory (default: bundled grammar)
    #[arg(short = 't', long, value_name = "DIR")]
    pub ts_source: Option<PathBuf>,

    /// Compiled tree-sitter grammar library path
    #[arg(short = 's', long, value_name = "PATH")]
    pub ts_out: Option<PathBuf>,

    /// Build or verify the grammar only, then exit
    #[arg(long)]
    pub init: bool,

    /// Print the planned edits as JSON instead of rewriting
    #[arg(long)]
    pub plan: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Resolved input and output for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub input: Input,
    pub output: Output,
}

impl Cli {
    /// Work out where to read from and write to.
    ///
    /// `stdin_is_terminal` decides whether a missing INFILE falls back to standard input.
    /// `--in-place` on standard input quietly becomes standard output.
    pub fn invocation(&self, stdin_is_terminal: bool) -> Result<Invocation, UsageError> {
        if self.in_place && self.outfile.is_some() {
            return Err(UsageError::InPlaceWithOutput);
        }

        let input = match &self.infile {
            Some(path) if path.as_os_str() == "-" => Input::Stdin,
            Some(path) => Input::File(path.clone()),
            None if stdin_is_terminal => return Err(UsageError::MissingInput),
            None => Input::Stdin,
        };

        let output = match (&input, &self.outfile) {
            (Input::File(path), None) if self.in_place => Output::InPlace(path.clone()),
            (_, Some(path)) if path.as_os_str() != "-" => Output::File(path.clone()),
            _ => Output::Stdout,
        };

        Ok(Invocation { input, output })
    }
}

/// Run the CLI to completion.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let options = config
        .grammar
        .options(cli.ts_source.clone(), cli.ts_out.clone());

    if cli.init {
        return init_grammar(&options);
    }

    let invocation = cli.invocation(std::io::stdin().is_terminal())?;
    let source = invocation.input.read()?;

    let grammar = Grammar::load(&options).context("failed to load C++ grammar")?;
    let remover =
        UsingRemover::new(source, &grammar).with_fallback(config.symbols.fallback_map());

    if cli.plan {
        let plan = remover.plan()?;
        let json = serde_json::to_string_pretty(plan).context("failed to serialize edit plan")?;
        return Output::Stdout.write(format!("{json}\n").as_bytes());
    }

    let output = remover.fix()?;
    invocation.output.write(output)?;
    tracing::info!(output = ?invocation.output, bytes = output.len(), "rewrite complete");
    Ok(())
}

fn init_grammar(options: &GrammarOptions) -> Result<()> {
    println!("Initializing tree-sitter library...");
    match &options.source {
        Some(source) => {
            println!("\tsource: {}", source.display());
            println!("\toutput: {}", options.library.display());
            build_grammar(source, &options.library, true)?;
            let grammar = Grammar::from_library(&options.library)?;
            tracing::debug!(?grammar, "compiled grammar loads");
            println!("Built!");
        }
        None => {
            println!("\tsource: bundled tree-sitter-cpp");
            let grammar = Grammar::bundled();
            tracing::debug!(?grammar, "bundled grammar ready");
            println!("Ready!");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("remusing").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn in_place_with_outfile_is_rejected() {
        let cli = parse(&["-i", "a.cpp", "b.cpp"]);
        assert_eq!(cli.invocation(false), Err(UsageError::InPlaceWithOutput));
    }

    #[test]
    fn terminal_stdin_without_infile_is_missing_input() {
        let cli = parse(&[]);
        assert_eq!(cli.invocation(true), Err(UsageError::MissingInput));
    }

    #[test]
    fn piped_stdin_is_used_when_no_infile() {
        let cli = parse(&[]);
        assert_eq!(
            cli.invocation(false),
            Ok(Invocation {
                input: Input::Stdin,
                output: Output::Stdout,
            })
        );
    }

    #[test]
    fn in_place_on_stdin_falls_back_to_stdout() {
        let cli = parse(&["-i", "-"]);
        assert_eq!(
            cli.invocation(true).map(|inv| inv.output),
            Ok(Output::Stdout)
        );
    }

    #[test]
    fn in_place_targets_infile() {
        let cli = parse(&["--in-place", "src/main.cpp"]);
        assert_eq!(
            cli.invocation(true).map(|inv| inv.output),
            Ok(Output::InPlace(PathBuf::from("src/main.cpp")))
        );
    }

    #[test]
    fn grammar_flags_parse() {
        let cli = parse(&["-t", "vendor/ts", "-s", "/tmp/cpp.so", "--init", "-vv"]);
        assert_eq!(cli.ts_source, Some(PathBuf::from("vendor/ts")));
        assert_eq!(cli.ts_out, Some(PathBuf::from("/tmp/cpp.so")));
        assert!(cli.init);
        assert_eq!(cli.verbose, 2);
    }
}
