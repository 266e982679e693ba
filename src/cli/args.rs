//! CLI argument parsing
//!
//! ```text
//! planrun [--config FILE] [-v...] [--log-json] <COMMAND>
//!
//! COMMANDS:
//!   execute <PLAN> [--root DIR] [--yes] [--json] [--report FILE]
//!   validate <PLAN> [--root DIR] [--json]
//!   parse <PLAN>
//! ```
//!
//! `<PLAN>` is a file path, or `-` for stdin.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse, validate and execute Markdown action plans
#[derive(Debug, Parser)]
#[command(name = "planrun", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: <root>/planrun.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse, validate and run a plan
    Execute(ExecuteArgs),

    /// Parse and validate a plan without running it
    Validate(ValidateArgs),

    /// Print the parsed plan as JSON
    Parse {
        /// Plan file, or - for stdin
        plan: String,
    },
}

#[derive(Debug, Args)]
pub struct ExecuteArgs {
    /// Plan file, or - for stdin
    pub plan: String,

    /// Project root (default: $PLANRUN_ROOT or the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Run without approval prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the report to FILE (.json → JSON, otherwise Markdown)
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Plan file, or - for stdin
    pub plan: String,

    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}
