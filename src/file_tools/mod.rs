//! File tools: deterministic filesystem operations
//!
//! All operations use the REAL filesystem: no mocks, no in-memory FS.

mod file_create;
mod file_read;
mod file_write;
mod local_fs;

pub use file_create::{file_create, FileCreateError};
pub use file_read::{file_read, FileReadError};
pub use file_write::{create_directory, file_write, FileWriteError};
pub use local_fs::LocalFileSystem;
