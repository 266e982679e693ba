//! file_create: Create a file that must not exist yet
//!
//! Creates parent directories if needed. Never overwrites.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during file create operations
#[derive(Error, Debug)]
pub enum FileCreateError {
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for file create operations
pub type Result<T> = std::result::Result<T, FileCreateError>;

/// Create a new file with exactly `content`
///
/// # Arguments
/// * `path` - Path to the file to create
/// * `content` - Content to write (UTF-8, written verbatim)
///
/// # Returns
/// * `Ok(())` - Success
/// * `Err(FileCreateError)` - File exists or creation failed
pub fn file_create(path: &Path, content: &str) -> Result<()> {
    let display = path.display().to_string();
    let io_err = |source| FileCreateError::Io {
        path: display.clone(),
        source,
    };

    if path.exists() {
        return Err(FileCreateError::AlreadyExists(display.clone()));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    // create_new also fails if the file appeared after the exists() check
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => FileCreateError::AlreadyExists(display.clone()),
            _ => io_err(e),
        })?;
    file.write_all(content.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;

    Ok(())
}
