//! file_write: Atomically overwrite a file
//!
//! Write to a sibling temp file, fsync, rename over the target.
//! Fails if the parent directory does not exist.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during file write operations
#[derive(Error, Debug)]
pub enum FileWriteError {
    #[error("Parent directory does not exist: {0}")]
    ParentNotFound(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for file write operations
pub type Result<T> = std::result::Result<T, FileWriteError>;

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

/// Atomically write content to a file
pub fn file_write(path: &Path, content: &str) -> Result<()> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(FileWriteError::ParentNotFound(parent.display().to_string()));
        }
    }

    let temp_path = temp_sibling(path);
    let write_temp = || -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    };

    if let Err(source) = write_temp().and_then(|_| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(FileWriteError::Io {
            path: display,
            source,
        });
    }

    Ok(())
}

/// Create a directory and any missing parents
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| FileWriteError::Io {
        path: path.display().to_string(),
        source,
    })
}
