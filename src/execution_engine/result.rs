//! Execution result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::plan::ActionKind;

/// Outcome of a single action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Success,
    Failure,
    Skipped,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Success => "SUCCESS",
            ActionStatus::Failure => "FAILURE",
            ActionStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Failure,
    Skipped,
    ValidationFailed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Failure => "FAILURE",
            RunStatus::Skipped => "SKIPPED",
            RunStatus::ValidationFailed => "VALIDATION_FAILED",
        }
    }

    /// Fold per-action statuses into a run status
    ///
    /// Any failure wins, then any success; a run where nothing ran
    /// (including an empty one) is skipped.
    pub fn from_actions<'a>(statuses: impl IntoIterator<Item = &'a ActionStatus>) -> Self {
        let mut any_success = false;
        for status in statuses {
            match status {
                ActionStatus::Failure => return RunStatus::Failure,
                ActionStatus::Success => any_success = true,
                ActionStatus::Skipped => {}
            }
        }
        if any_success {
            RunStatus::Success
        } else {
            RunStatus::Skipped
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log entry for one action, appended in plan order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_kind: ActionKind,
    pub params: Map<String, Value>,
    pub status: ActionStatus,
    pub details: Value,
}

impl ActionLog {
    pub fn new(
        action_kind: ActionKind,
        params: Map<String, Value>,
        status: ActionStatus,
        details: Value,
    ) -> Self {
        ActionLog {
            action_kind,
            params,
            status,
            details,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == ActionStatus::Failure
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl RunSummary {
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }
}

/// Everything known about one run of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub plan_title: String,
    pub run_summary: RunSummary,
    pub action_logs: Vec<ActionLog>,
    pub validation_errors: Vec<String>,
    /// Best-effort file content captured when something went wrong
    pub failed_resources: BTreeMap<String, String>,
}

impl ExecutionReport {
    /// Report for a run that never reached execution
    pub fn validation_failed(
        plan_title: impl Into<String>,
        validation_errors: Vec<String>,
        failed_resources: BTreeMap<String, String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        ExecutionReport {
            plan_title: plan_title.into(),
            run_summary: RunSummary {
                status: RunStatus::ValidationFailed,
                start_time,
                end_time: Utc::now(),
            },
            action_logs: Vec::new(),
            validation_errors,
            failed_resources,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.run_summary.status
    }

    pub fn count(&self, status: ActionStatus) -> usize {
        self.action_logs
            .iter()
            .filter(|log| log.status == status)
            .count()
    }
}

/// Maps a run status to a process exit code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    /// Treat an all-skipped run as a failure
    pub skipped_is_failure: bool,
}

impl ExitPolicy {
    pub fn is_success(&self, status: RunStatus) -> bool {
        match status {
            RunStatus::Success => true,
            RunStatus::Skipped => !self.skipped_is_failure,
            RunStatus::Failure | RunStatus::ValidationFailed => false,
        }
    }

    pub fn exit_code(&self, status: RunStatus) -> i32 {
        if self.is_success(status) {
            0
        } else {
            1
        }
    }
}
