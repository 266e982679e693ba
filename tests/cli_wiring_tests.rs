//! CLI wiring integration tests
//!
//! Tests end-to-end CLI behavior:
//! - Subcommand dispatch (execute, validate, parse)
//! - Root resolution
//! - Exit codes
//! - Output formats
//!
//! All tests use real binary execution via std::process::Command.
//! All tests use temp directories as the project root.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn planrun_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_planrun"))
}

fn run(args: &[&str], root: &Path) -> Output {
    Command::new(planrun_binary())
        .args(args)
        .env("PLANRUN_ROOT", root)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run planrun binary")
}

fn write_plan(dir: &Path, body: &str) -> PathBuf {
    let text = format!(
        "# CLI plan\n\n- **Status:** Green\n\n## Rationale\n```text\nCLI test.\n```\n\n## Action Plan\n\n{}",
        body
    );
    let path = dir.join("plan.md");
    fs::write(&path, text).expect("Failed to write plan");
    path
}

const CREATE_BODY: &str = "### `CREATE`\n- **File Path:** [out](/out.txt)\n\n```text\nfrom the cli\n```\n";

#[test]
fn test_execute_yes_runs_plan() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let plans = TempDir::new().expect("Failed to create temp dir");
    let plan = write_plan(plans.path(), CREATE_BODY);

    let output = run(&["execute", plan.to_str().unwrap(), "--yes"], root.path());

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Execution Report: CLI plan"), "stdout: {stdout}");
    assert_eq!(
        fs::read_to_string(root.path().join("out.txt")).expect("Failed to read output file"),
        "from the cli\n"
    );
}

#[test]
fn test_execute_json_and_report_file() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let plans = TempDir::new().expect("Failed to create temp dir");
    let plan = write_plan(plans.path(), CREATE_BODY);
    let report_path = plans.path().join("report.json");

    let output = Command::new(planrun_binary())
        .args([
            "execute",
            plan.to_str().unwrap(),
            "--root",
            root.path().to_str().unwrap(),
            "--yes",
            "--json",
            "--report",
            report_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run planrun binary");

    assert_eq!(output.status.code(), Some(0));
    let printed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(printed["run_summary"]["status"], "SUCCESS");

    let saved: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(&report_path).expect("Failed to read report file"),
    )
    .expect("report file should be JSON");
    assert_eq!(saved["plan_title"], "CLI plan");
}

#[test]
fn test_execute_failure_exit_code() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let plans = TempDir::new().expect("Failed to create temp dir");
    let plan = write_plan(
        plans.path(),
        "### `EXECUTE`\n- **Description:** fail\n\n```bash\nexit 3\n```\n",
    );

    let output = run(&["execute", plan.to_str().unwrap(), "--yes"], root.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("FAILURE"));
}

#[test]
fn test_validate_reports_problems() {
    let root = TempDir::new().expect("Failed to create temp dir");
    fs::write(root.path().join("out.txt"), "taken").expect("Failed to write file");
    let plans = TempDir::new().expect("Failed to create temp dir");
    let plan = write_plan(plans.path(), CREATE_BODY);

    let output = run(&["validate", plan.to_str().unwrap()], root.path());

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("already exists"), "stdout: {stdout}");
    assert_eq!(
        fs::read_to_string(root.path().join("out.txt")).expect("Failed to read file"),
        "taken"
    );
}

#[test]
fn test_validate_clean_plan() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let plans = TempDir::new().expect("Failed to create temp dir");
    let plan = write_plan(plans.path(), CREATE_BODY);

    let output = run(&["validate", plan.to_str().unwrap()], root.path());

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("is valid (1 actions)"));
    assert!(!root.path().join("out.txt").exists());
}

#[test]
fn test_parse_prints_plan_json() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let plans = TempDir::new().expect("Failed to create temp dir");
    let plan = write_plan(plans.path(), CREATE_BODY);

    let output = run(&["parse", plan.to_str().unwrap()], root.path());

    assert_eq!(output.status.code(), Some(0));
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["title"], "CLI plan");
    assert_eq!(parsed["actions"][0]["kind"], "CREATE");
    assert_eq!(parsed["actions"][0]["path"], "out.txt");
}

#[test]
fn test_missing_plan_file_is_usage_error() {
    let root = TempDir::new().expect("Failed to create temp dir");

    let output = run(&["execute", "does-not-exist.md", "--yes"], root.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Plan file not found"));
}
