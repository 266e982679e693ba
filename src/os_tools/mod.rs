//! OS tools: System-level operations
//!
//! - `bash_exec`: shell command execution with timeouts, confined to the project root

pub mod bash_exec;

pub use bash_exec::{
    bash_exec, resolve_cwd, BashExecArgs, BashExecResult, LocalShellRunner, ShellError,
};
