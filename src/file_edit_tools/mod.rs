//! File edit tools: verbatim find/replace editing
//!
//! Each edit replaces exactly one occurrence of its `find` text. Edits are
//! applied in order against the result of the previous edit, and the file
//! is only written once every edit has applied.

use std::path::Path;

use crate::file_tools::{file_read, file_write, FileReadError, FileWriteError};
use crate::plan::EditPair;

/// Error type for file edit operations
#[derive(Debug, thiserror::Error)]
pub enum FileEditError {
    #[error(transparent)]
    Read(#[from] FileReadError),

    #[error(transparent)]
    Write(#[from] FileWriteError),

    #[error("Edit #{index}: FIND text not found in {path}")]
    FindNotFound { path: String, index: usize },
}

/// File edit result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEditResult {
    /// Number of edits applied
    pub edits_applied: usize,
    /// Content before editing
    pub before: String,
    /// Content after editing
    pub after: String,
}

/// Apply `edits` to `content` in memory
///
/// Returns the 1-based index of the first edit whose `find` text is missing.
pub fn apply_edits(content: &str, edits: &[EditPair]) -> Result<String, usize> {
    let mut current = content.to_string();
    for (idx, edit) in edits.iter().enumerate() {
        if !current.contains(&edit.find) {
            return Err(idx + 1);
        }
        current = current.replacen(&edit.find, &edit.replace, 1);
    }
    Ok(current)
}

/// Edit a file in place with find/replace pairs
pub fn file_edit(path: &Path, edits: &[EditPair]) -> Result<FileEditResult, FileEditError> {
    let before = file_read(path)?;
    let after = apply_edits(&before, edits).map_err(|index| FileEditError::FindNotFound {
        path: path.display().to_string(),
        index,
    })?;

    file_write(path, &after)?;

    Ok(FileEditResult {
        edits_applied: edits.len(),
        before,
        after,
    })
}
