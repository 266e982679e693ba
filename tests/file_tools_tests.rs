// Integration tests for file tools
// Tests use REAL filesystem: no mocks

use planrun::execution_engine::FileSystemManager;
use planrun::file_edit_tools::{file_edit, FileEditError};
use planrun::file_tools::{self, FileCreateError, FileReadError, FileWriteError, LocalFileSystem};
use planrun::EditPair;
use std::fs;
use tempfile::TempDir;

fn pair(find: &str, replace: &str) -> EditPair {
    EditPair {
        find: find.to_string(),
        replace: replace.to_string(),
    }
}

#[test]
fn test_file_read_existing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("test_file.txt");
    let content = "Hello, World!";

    fs::write(&file_path, content).expect("Failed to write test file");

    let result = file_tools::file_read(&file_path);
    assert!(result.is_ok(), "file_read should succeed for existing file");
    assert_eq!(result.unwrap(), content);
}

#[test]
fn test_file_read_missing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("nonexistent.txt");

    let result = file_tools::file_read(&file_path);
    assert!(matches!(result, Err(FileReadError::NotFound(_))));
}

#[test]
fn test_file_read_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let result = file_tools::file_read(temp_dir.path());
    assert!(matches!(result, Err(FileReadError::NotAFile(_))));
}

#[test]
fn test_file_write_overwrite() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("existing.txt");
    fs::write(&file_path, "old").expect("Failed to write test file");

    file_tools::file_write(&file_path, "new").expect("file_write should succeed");

    let read_content = fs::read_to_string(&file_path).expect("Failed to read back");
    assert_eq!(read_content, "new");

    // No temp siblings left behind
    let entries = fs::read_dir(temp_dir.path()).expect("Failed to list dir").count();
    assert_eq!(entries, 1);
}

#[test]
fn test_file_write_missing_parent() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("missing").join("file.txt");

    let result = file_tools::file_write(&file_path, "x");
    assert!(matches!(result, Err(FileWriteError::ParentNotFound(_))));
}

#[test]
fn test_file_create_creates_parent_dirs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("a").join("b").join("new.txt");

    file_tools::file_create(&file_path, "content\n").expect("file_create should succeed");
    assert_eq!(
        fs::read_to_string(&file_path).expect("Failed to read back"),
        "content\n"
    );
}

#[test]
fn test_file_create_existing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("existing.txt");
    fs::write(&file_path, "original").expect("Failed to write test file");

    let result = file_tools::file_create(&file_path, "replacement");
    assert!(matches!(result, Err(FileCreateError::AlreadyExists(_))));
    assert_eq!(
        fs::read_to_string(&file_path).expect("Failed to read back"),
        "original"
    );
}

#[test]
fn test_file_edit_sequential_pairs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("lib.rs");
    fs::write(&file_path, "fn a() {}\nfn b() {}\n").expect("Failed to write test file");

    let result = file_edit(&file_path, &[pair("fn a()", "fn alpha()"), pair("fn b()", "fn beta()")])
        .expect("file_edit should succeed");
    assert_eq!(result.edits_applied, 2);
    assert_eq!(result.before, "fn a() {}\nfn b() {}\n");
    assert_eq!(
        fs::read_to_string(&file_path).expect("Failed to read back"),
        "fn alpha() {}\nfn beta() {}\n"
    );
}

#[test]
fn test_file_edit_not_found_is_atomic() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("lib.rs");
    fs::write(&file_path, "one\n").expect("Failed to write test file");

    let result = file_edit(&file_path, &[pair("one", "two"), pair("three", "four")]);
    assert!(matches!(result, Err(FileEditError::FindNotFound { index: 2, .. })));
    assert_eq!(fs::read_to_string(&file_path).expect("Failed to read back"), "one\n");
}

#[test]
fn test_local_file_system_is_rooted() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let local = LocalFileSystem::new(temp_dir.path());

    local
        .create_file("docs/readme.md", "# Hi\n")
        .expect("create_file should succeed");
    assert!(local.path_exists("docs/readme.md"));
    assert!(temp_dir.path().join("docs/readme.md").is_file());
    assert_eq!(local.read_file("docs/readme.md").unwrap(), "# Hi\n");

    let err = local
        .create_file("docs/readme.md", "again")
        .expect_err("second create should fail");
    assert!(err.message.contains("already exists"), "got: {}", err.message);

    let applied = local
        .edit_file("docs/readme.md", &[pair("Hi", "Hello")])
        .expect("edit_file should succeed");
    assert_eq!(applied, 1);
    assert_eq!(local.read_file("docs/readme.md").unwrap(), "# Hello\n");

    local.create_directory("out/logs").expect("create_directory should succeed");
    local
        .write_file("out/logs/run.txt", "ok")
        .expect("write_file should succeed");
    assert_eq!(local.read_file("out/logs/run.txt").unwrap(), "ok");
}
