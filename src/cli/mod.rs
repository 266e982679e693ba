//! CLI module
//!
//! Provides:
//! - Argument parsing (clap derive)
//! - Project root resolution (flag → env → cwd)
//! - Subcommand dispatch (execute, validate, parse)
//! - Logging setup

pub mod args;
pub mod dispatch;
pub mod logging;
pub mod root;

// Re-exports
pub use args::{Cli, Command, ExecuteArgs, ValidateArgs};
pub use dispatch::{run_cli, ExitCode};
pub use logging::init_logging;
pub use root::resolve_root;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Web client error: {0}")]
    Web(#[from] crate::web_tools::WebError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
/// Run failed, plan invalid, or (when configured) every action skipped
pub const EXIT_FAILURE: i32 = 1;
/// Usage, configuration or I/O problem before anything ran
pub const EXIT_USAGE_ERROR: i32 = 2;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;
