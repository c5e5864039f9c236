//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

/// lzn CLI options.
#[derive(Debug, Parser)]
#[command(name = "lzn", version, about = "Lint MiniZinc models")]
pub struct Args {
    /// Don't run the rule with the given id or name. Repeatable.
    #[arg(short = 'i', long = "ignore", value_name = "ID_OR_NAME")]
    pub ignore: Vec<String>,

    /// Don't run rules of the given category. Repeatable.
    #[arg(short = 'c', long = "ignore-category", value_name = "NAME")]
    pub ignore_category: Vec<String>,

    /// Path to an lzn.toml config file. If omitted, lzn searches the model's
    /// parent directories.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List all known rules and exit.
    #[arg(long)]
    pub list_rules: bool,

    /// The model to lint.
    #[arg(value_name = "MODEL_FILE", required_unless_present = "list_rules")]
    pub model_file: Option<PathBuf>,
}
