//! bash_exec: shell command execution for EXECUTE actions
//!
//! - Commands are executed via `bash -c` (`cmd /C` on Windows)
//! - Timeout is enforced; a timed out command is killed and reports exit code 124
//! - Stdout and stderr are captured separately
//! - The working directory must stay inside the project root

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::execution_engine::{CollaboratorError, ShellOutput, ShellRunner};
use crate::plan::paths::looks_absolute;

/// Maximum execution time (default: 300 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// Exit code reported for a command killed on timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output is still collected once the shell itself has exited
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Shell execution errors
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Working directory must be relative to the project root: {0}")]
    AbsoluteCwd(String),

    #[error("Working directory escapes the project root: {0}")]
    EscapingCwd(String),

    #[error("Working directory does not exist: {0}")]
    MissingCwd(String),

    #[error("Failed to start command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to wait for command: {0}")]
    Wait(#[source] std::io::Error),
}

/// Arguments for bash_exec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BashExecArgs {
    /// Command to execute
    pub command: String,
    /// Timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// Working directory (already resolved)
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Result of command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BashExecResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration_ms: u64,
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("bash");
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Forward everything read from `source` in chunks
///
/// The reader may outlive the shell when a background process inherited the
/// pipe, so the caller collects with a deadline instead of joining.
fn drain<R: Read + Send + 'static>(source: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut source) = source {
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match source.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
    rx
}

fn collect(rx: &mpsc::Receiver<Vec<u8>>, deadline: Instant) -> String {
    let mut buf = Vec::new();
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Kill the shell and everything it started
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // The shell leads its own process group; a negative pid targets the group
    let _ = Command::new("kill")
        .args(["-KILL", "--", &format!("-{}", child.id())])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Execute a command, killing it once the timeout elapses
pub fn bash_exec(args: &BashExecArgs) -> Result<BashExecResult, ShellError> {
    let start = Instant::now();
    let timeout = Duration::from_millis(args.timeout_ms);

    let mut cmd = shell_command(&args.command);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .envs(&args.env);
    if let Some(ref dir) = args.working_dir {
        cmd.current_dir(dir);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(ShellError::Spawn)?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait().map_err(ShellError::Wait)? {
            break Some(status);
        }
        if start.elapsed() >= timeout {
            timed_out = true;
            kill_tree(&mut child);
            let _ = child.wait();
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let deadline = Instant::now() + DRAIN_GRACE;
    let stdout = collect(&stdout, deadline);
    let mut stderr = collect(&stderr, deadline);

    let exit_code = match status {
        Some(status) => status.code().unwrap_or(-1),
        None => {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!("Command timed out after {} ms", args.timeout_ms));
            TIMEOUT_EXIT_CODE
        }
    };

    Ok(BashExecResult {
        exit_code,
        stdout,
        stderr,
        timed_out,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Resolve a plan-supplied working directory inside `root`
///
/// `..` segments are allowed as long as they never climb above the root.
pub fn resolve_cwd(root: &Path, cwd: Option<&str>) -> Result<PathBuf, ShellError> {
    let Some(raw) = cwd.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(root.to_path_buf());
    };

    let relative = Path::new(raw);
    if relative.is_absolute() || looks_absolute(raw) || raw.starts_with('/') {
        return Err(ShellError::AbsoluteCwd(raw.to_string()));
    }

    let mut resolved = PathBuf::new();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(ShellError::EscapingCwd(raw.to_string()));
                }
                depth -= 1;
                resolved.pop();
            }
            Component::Normal(part) => {
                depth += 1;
                resolved.push(part);
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ShellError::AbsoluteCwd(raw.to_string()));
            }
        }
    }

    let full = root.join(resolved);
    if !full.is_dir() {
        return Err(ShellError::MissingCwd(raw.to_string()));
    }
    Ok(full)
}

/// Shell runner rooted at the project directory
#[derive(Debug, Clone)]
pub struct LocalShellRunner {
    root: PathBuf,
    timeout_ms: u64,
}

impl LocalShellRunner {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        LocalShellRunner {
            root: root.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

impl ShellRunner for LocalShellRunner {
    fn execute(
        &self,
        command: &str,
        cwd: Option<&str>,
        env: &BTreeMap<String, String>,
    ) -> Result<ShellOutput, CollaboratorError> {
        let working_dir = resolve_cwd(&self.root, cwd).map_err(CollaboratorError::from_display)?;
        tracing::debug!(%command, cwd = %working_dir.display(), "Running shell command");

        let result = bash_exec(&BashExecArgs {
            command: command.to_string(),
            timeout_ms: self.timeout_ms,
            working_dir: Some(working_dir),
            env: env.clone(),
        })
        .map_err(CollaboratorError::from_display)?;

        if result.timed_out {
            tracing::warn!(%command, timeout_ms = self.timeout_ms, "Shell command timed out");
        }

        Ok(ShellOutput {
            stdout: result.stdout,
            stderr: result.stderr,
            return_code: result.exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(command: &str) -> BashExecArgs {
        BashExecArgs {
            command: command.to_string(),
            timeout_ms: 5000,
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    #[test]
    fn test_bash_exec_echo() {
        let result = bash_exec(&args("echo 'hello world'")).unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("hello world"));
        assert!(result.stderr.is_empty());
        assert!(!result.timed_out);
    }

    #[test]
    fn test_bash_exec_exit_code() {
        let result = bash_exec(&args("exit 42")).unwrap();
        assert_eq!(result.exit_code, 42);
    }

    #[test]
    fn test_bash_exec_stderr() {
        let result = bash_exec(&args("echo 'error' >&2")).unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(result.stderr.contains("error"));
    }

    #[test]
    fn test_bash_exec_env() {
        let mut a = args("echo \"$GREETING\"");
        a.env.insert("GREETING".to_string(), "hi there".to_string());
        let result = bash_exec(&a).unwrap();
        assert_eq!(result.stdout.trim(), "hi there");
    }

    #[test]
    fn test_bash_exec_timeout() {
        let mut a = args("sleep 5");
        a.timeout_ms = 100;
        let result = bash_exec(&a).unwrap();
        assert!(result.timed_out);
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
        assert!(result.stderr.contains("timed out"));
    }

    #[test]
    fn test_bash_exec_timeout_kills_child_processes() {
        let mut a = args("sleep 4; echo done");
        a.timeout_ms = 200;
        let result = bash_exec(&a).unwrap();
        assert!(result.timed_out);
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
        assert!(!result.stdout.contains("done"));
        assert!(result.duration_ms < 2000, "took {} ms", result.duration_ms);
    }

    #[test]
    fn test_bash_exec_background_child_does_not_block() {
        let result = bash_exec(&args("sleep 4 & echo started")).unwrap();
        assert!(!result.timed_out);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout.trim(), "started");
        assert!(result.duration_ms < 2000, "took {} ms", result.duration_ms);
    }

    #[test]
    fn test_resolve_cwd_rules() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        let root = temp_dir.path();

        assert_eq!(resolve_cwd(root, None).unwrap(), root.to_path_buf());
        assert_eq!(resolve_cwd(root, Some("sub")).unwrap(), root.join("sub"));
        assert_eq!(resolve_cwd(root, Some("sub/../sub")).unwrap(), root.join("sub"));
        assert!(matches!(
            resolve_cwd(root, Some("/tmp")),
            Err(ShellError::AbsoluteCwd(_))
        ));
        assert!(matches!(
            resolve_cwd(root, Some("sub/../..")),
            Err(ShellError::EscapingCwd(_))
        ));
        assert!(matches!(
            resolve_cwd(root, Some("missing")),
            Err(ShellError::MissingCwd(_))
        ));
    }

    #[test]
    fn test_runner_uses_cwd() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        std::fs::write(temp_dir.path().join("sub/marker.txt"), "").unwrap();

        let runner = LocalShellRunner::new(temp_dir.path(), Duration::from_secs(5));
        let output = runner.execute("ls", Some("sub"), &BTreeMap::new()).unwrap();
        assert_eq!(output.return_code, 0);
        assert!(output.stdout.contains("marker.txt"));

        let err = runner.execute("ls", Some("../"), &BTreeMap::new()).unwrap_err();
        assert!(err.message.contains("escapes"));
    }
}
