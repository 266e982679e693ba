//! Collaborator contracts
//!
//! The engine reaches the outside world only through these traits. All calls
//! are synchronous and blocking; `UserInteractor::confirm_action` may block
//! indefinitely while a human decides.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::execution_engine::result::ActionLog;
use crate::plan::{ActionData, EditPair};

/// Error raised by a collaborator; the text is surfaced verbatim in logs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        CollaboratorError {
            message: message.into(),
        }
    }

    pub fn from_display(err: impl Display) -> Self {
        CollaboratorError::new(err.to_string())
    }
}

/// Project-root-relative filesystem access
pub trait FileSystemManager: Send + Sync {
    fn path_exists(&self, path: &str) -> bool;

    /// Fails if the file already exists
    fn create_file(&self, path: &str, content: &str) -> Result<(), CollaboratorError>;

    /// Fails if the file is absent
    fn read_file(&self, path: &str) -> Result<String, CollaboratorError>;

    /// Applies each pair as one verbatim, non-repeated replacement, in order.
    /// Returns the number of edits applied.
    fn edit_file(&self, path: &str, edits: &[EditPair]) -> Result<usize, CollaboratorError>;

    fn write_file(&self, path: &str, content: &str) -> Result<(), CollaboratorError>;

    fn create_directory(&self, path: &str) -> Result<(), CollaboratorError>;
}

/// Captured result of a shell command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
}

/// Runs shell commands
///
/// Implementations reject a `cwd` that is absolute or escapes the project
/// root, with an error the dispatcher reports verbatim.
pub trait ShellRunner: Send + Sync {
    fn execute(
        &self,
        command: &str,
        cwd: Option<&str>,
        env: &BTreeMap<String, String>,
    ) -> Result<ShellOutput, CollaboratorError>;
}

/// Fetches remote content for READ actions on URLs
pub trait ContentFetcher: Send + Sync {
    fn get_content(&self, url: &str) -> Result<String, CollaboratorError>;
}

/// Runs web searches for RESEARCH actions
pub trait WebSearcher: Send + Sync {
    fn search(&self, queries: &[String]) -> Result<Value, CollaboratorError>;
}

/// Outcome of an approval prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDecision {
    pub approved: bool,
    /// Reason given by the user (may be empty)
    pub reason: String,
}

impl ApprovalDecision {
    pub fn approve() -> Self {
        ApprovalDecision {
            approved: true,
            reason: String::new(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        ApprovalDecision {
            approved: false,
            reason: reason.into(),
        }
    }
}

/// Human in the loop
pub trait UserInteractor: Send + Sync {
    /// Ask the user to approve an action; blocks until answered
    fn confirm_action(&self, action: &ActionData, prompt_text: &str) -> ApprovalDecision;

    /// Ask a free-form question (CHAT_WITH_USER)
    fn ask_question(&self, prompt_text: &str) -> Result<String, CollaboratorError>;

    fn notify_skipped_action(&self, action: &ActionData, reason: &str);
}

/// Progress notifications from the orchestrator
pub trait ProgressCallback: Send + Sync {
    /// Called before an action is considered (1-based index)
    fn on_action_start(&self, index: usize, total: usize, action: &ActionData);

    /// Called once the action's log entry is final
    fn on_action_complete(&self, index: usize, log: &ActionLog);
}
