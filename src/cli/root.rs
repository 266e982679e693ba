//! Project root resolution
//!
//! Priority:
//! 1. `--root <path>` flag
//! 2. `$PLANRUN_ROOT`
//! 3. Current directory

use std::path::PathBuf;

use crate::cli::{Error, Result};

/// Environment variable naming the default project root
pub const ROOT_ENV: &str = "PLANRUN_ROOT";

/// Resolve the project root; it must be an existing directory
pub fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let root = explicit
        .or_else(|| {
            std::env::var(ROOT_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("."));

    if !root.is_dir() {
        return Err(Error::InvalidArgs(format!(
            "project root '{}' is not a directory",
            root.display()
        )));
    }
    Ok(root)
}
