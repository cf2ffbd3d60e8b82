//! # Zerg bootstrap
//!
//! Entry point for the interpreter binary: reads a Zerg source file, runs
//! it, and reports parse or runtime errors on stderr.

mod cli;

use std::fs;
use std::process::ExitCode;

use cli::Cli;
use log::error;

fn main() -> ExitCode {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let source = match fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            error!("could not read {}: {e}", args.file.display());
            return ExitCode::FAILURE;
        }
    };

    let outcome = zerg::run_source(&source, Some(&args.file), args.script_args);

    for err in &outcome.parse_errors {
        eprintln!("{err}");
    }

    if let zerg::evaluator::value::Value::Error(message) = &outcome.value {
        eprintln!("{message}");
    }

    if outcome.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
