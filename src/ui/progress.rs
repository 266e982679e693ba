//! Console progress lines

use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::Value;

use crate::execution_engine::{ActionLog, ActionStatus, ProgressCallback};
use crate::plan::ActionData;

/// Writes one line per action start and outcome
pub struct ConsoleProgress {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleProgress {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    fn line(&self, text: String) {
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        let _ = writeln!(out, "{text}");
    }
}

pub fn start_line(index: usize, total: usize, action: &ActionData) -> String {
    let target = action.target_path().map(|p| format!(" {p}")).unwrap_or_default();
    match action.description {
        Some(ref description) => {
            format!("[{index}/{total}] {}{target} ({description})", action.kind())
        }
        None => format!("[{index}/{total}] {}{target}", action.kind()),
    }
}

pub fn outcome_line(log: &ActionLog) -> String {
    match log.status {
        ActionStatus::Failure => match failure_summary(&log.details) {
            Some(error) => format!("  -> FAILURE: {error}"),
            None => "  -> FAILURE".to_string(),
        },
        ActionStatus::Skipped => match log.details.get("reason").and_then(|r| r.as_str()) {
            Some(reason) => format!("  -> SKIPPED: {reason}"),
            None => "  -> SKIPPED".to_string(),
        },
        ActionStatus::Success => "  -> SUCCESS".to_string(),
    }
}

/// Error text, or exit code plus last stderr line for shell results
fn failure_summary(details: &Value) -> Option<String> {
    if let Some(error) = details.as_str() {
        return Some(error.to_string());
    }
    if let Some(error) = details.get("error").and_then(Value::as_str) {
        return Some(error.to_string());
    }
    let code = details.get("return_code").and_then(Value::as_i64)?;
    let last_stderr = details
        .get("stderr")
        .and_then(Value::as_str)
        .and_then(|stderr| stderr.lines().rev().find(|line| !line.trim().is_empty()));
    Some(match last_stderr {
        Some(line) => format!("exit code {code} ({})", line.trim()),
        None => format!("exit code {code}"),
    })
}

impl ProgressCallback for ConsoleProgress {
    fn on_action_start(&self, index: usize, total: usize, action: &ActionData) {
        self.line(start_line(index, total, action));
    }

    fn on_action_complete(&self, _index: usize, log: &ActionLog) {
        self.line(outcome_line(log));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Action, ActionKind};
    use serde_json::{json, Map};

    #[test]
    fn test_start_line_shows_target() {
        let action = ActionData::new(
            Action::Create {
                path: "src/a.rs".to_string(),
                content: String::new(),
            },
            Some("Add module".to_string()),
        );
        assert_eq!(start_line(1, 4, &action), "[1/4] CREATE src/a.rs (Add module)");
    }

    #[test]
    fn test_outcome_lines() {
        let skipped = ActionLog::new(
            ActionKind::Execute,
            Map::new(),
            ActionStatus::Skipped,
            json!({"reason": "halted by a previous failure"}),
        );
        assert_eq!(outcome_line(&skipped), "  -> SKIPPED: halted by a previous failure");

        let failed = ActionLog::new(
            ActionKind::Read,
            Map::new(),
            ActionStatus::Failure,
            json!("File not found: x"),
        );
        assert_eq!(outcome_line(&failed), "  -> FAILURE: File not found: x");
    }

    #[test]
    fn test_outcome_line_for_structured_failures() {
        let shell = ActionLog::new(
            ActionKind::Execute,
            Map::new(),
            ActionStatus::Failure,
            json!({"stdout": "", "stderr": "warming up\nno such target\n", "return_code": 2}),
        );
        assert_eq!(outcome_line(&shell), "  -> FAILURE: exit code 2 (no such target)");

        let quiet = ActionLog::new(
            ActionKind::Execute,
            Map::new(),
            ActionStatus::Failure,
            json!({"stdout": "", "stderr": "", "return_code": 1}),
        );
        assert_eq!(outcome_line(&quiet), "  -> FAILURE: exit code 1");

        let enriched = ActionLog::new(
            ActionKind::Create,
            Map::new(),
            ActionStatus::Failure,
            json!({"error": "File already exists: a.txt", "file_content": "old"}),
        );
        assert_eq!(outcome_line(&enriched), "  -> FAILURE: File already exists: a.txt");
    }
}
