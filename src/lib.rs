//! Zerg bootstrap interpreter: lexer, parser, evaluator, and module loader
//! wired into one `run_source` entry point shared by the CLI and the
//! integration test suite.

pub mod evaluator;
pub mod lexer;
pub mod loader;
pub mod parser;

use std::path::{Path, PathBuf};

use evaluator::value::Value;
use evaluator::Evaluator;
use parser::ParseError;

/// Result of running a complete program: either a final [`Value`] (which may
/// itself be `Value::Error` if evaluation failed), or the parse errors
/// collected before evaluation ever started.
pub struct RunOutcome {
    pub value: Value,
    pub parse_errors: Vec<ParseError>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        if !self.parse_errors.is_empty() || self.value.is_error() {
            1
        } else {
            0
        }
    }
}

/// Runs `source` as a complete program. `path`, when given, anchors module
/// resolution — `import` statements inside `source` resolve relative to its
/// parent directory. `program_args` becomes the value `sys.args()` returns.
pub fn run_source(source: &str, path: Option<&Path>, program_args: Vec<String>) -> RunOutcome {
    let entry_dir = path
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let search_paths = vec![entry_dir.clone()];
    let evaluator = Evaluator::new(entry_dir, search_paths, program_args);
    let env = evaluator.new_root_env();
    let (value, parse_errors) = evaluator.eval_source(source, &env);
    RunOutcome { value, parse_errors }
}
