//! file_read: Read an entire file as UTF-8

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during file read operations
#[derive(Error, Debug)]
pub enum FileReadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for file read operations
pub type Result<T> = std::result::Result<T, FileReadError>;

/// Read entire file into a UTF-8 string
pub fn file_read(path: &Path) -> Result<String> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(FileReadError::NotFound(display));
    }
    if !path.is_file() {
        return Err(FileReadError::NotAFile(display));
    }

    fs::read_to_string(path).map_err(|source| FileReadError::Io {
        path: display,
        source,
    })
}
