//! LocalFileSystem: the filesystem manager used by validation and execution
//!
//! All plan paths are interpreted relative to the project root.

use std::path::{Path, PathBuf};

use crate::execution_engine::{CollaboratorError, FileSystemManager};
use crate::file_edit_tools::file_edit;
use crate::file_tools::{create_directory, file_create, file_read, file_write};
use crate::plan::EditPair;

/// Real filesystem rooted at a project directory
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFileSystem { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a plan path against the root (absolute paths pass through)
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }
}

impl FileSystemManager for LocalFileSystem {
    fn path_exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn create_file(&self, path: &str, content: &str) -> Result<(), CollaboratorError> {
        file_create(&self.resolve(path), content).map_err(CollaboratorError::from_display)
    }

    fn read_file(&self, path: &str) -> Result<String, CollaboratorError> {
        file_read(&self.resolve(path)).map_err(CollaboratorError::from_display)
    }

    fn edit_file(&self, path: &str, edits: &[EditPair]) -> Result<usize, CollaboratorError> {
        file_edit(&self.resolve(path), edits)
            .map(|result| result.edits_applied)
            .map_err(CollaboratorError::from_display)
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), CollaboratorError> {
        file_write(&self.resolve(path), content).map_err(CollaboratorError::from_display)
    }

    fn create_directory(&self, path: &str) -> Result<(), CollaboratorError> {
        create_directory(&self.resolve(path)).map_err(CollaboratorError::from_display)
    }
}
