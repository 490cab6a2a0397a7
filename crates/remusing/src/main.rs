use std::process::ExitCode;

use clap::Parser;

use remusing::cli::{self, Cli};

fn main() -> ExitCode {
    let args = Cli::parse();
    remusing::init(args.verbose);

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
