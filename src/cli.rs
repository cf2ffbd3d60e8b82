//! Cli
//!
//! Command-line argument parsing for the zerg-bootstrap interpreter.

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bootstrap interpreter for the Zerg scripting language.")]
pub struct Cli {
    /// The path to the Zerg source file to run.
    pub file: std::path::PathBuf,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,

    /// Arguments passed through to the running script, available to it via
    /// `sys.args()`.
    #[arg(trailing_var_arg = true)]
    pub script_args: Vec<String>,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Log level of the interpreter.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings, e.g. a module resolved via a search path fallback.
    #[value(alias("1"))]
    Warn,

    /// Log general interpreter progress, e.g. which modules get loaded.
    #[value(alias("2"))]
    Info,

    /// Log internal evaluator steps. Can be quite noisy.
    #[value(alias("3"))]
    Debug,

    /// Log everything, including module cache hits.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
