//! Execution engine: validates and runs parsed plans
//!
//! Strictly sequential: one action at a time, in plan order. The engine
//! talks to the outside world only through the collaborator traits.

mod collaborators;
mod dispatcher;
mod orchestrator;
mod pipeline;
mod preconditions;
mod result;

pub use collaborators::{
    ApprovalDecision, CollaboratorError, ContentFetcher, FileSystemManager, ProgressCallback,
    ShellOutput, ShellRunner, UserInteractor, WebSearcher,
};
pub use dispatcher::{normalize, DispatchOutput, Dispatcher};
pub use orchestrator::{Orchestrator, DECLINED_REASON, HALTED_REASON};
pub use pipeline::{collect_failed_resources, run_plan, PipelineOptions, UNTITLED_PLAN};
pub use preconditions::{check_path_safety, validate_action, validate_plan, ValidationError};
pub use result::{ActionLog, ActionStatus, ExecutionReport, ExitPolicy, RunStatus, RunSummary};

use crate::plan::ActionData;

/// Approves every action; has nobody to answer questions (for testing
/// and `--yes` runs)
#[derive(Clone, Copy)]
pub struct AutoApprove;

impl UserInteractor for AutoApprove {
    fn confirm_action(&self, _action: &ActionData, _prompt_text: &str) -> ApprovalDecision {
        ApprovalDecision::approve()
    }

    fn ask_question(&self, prompt_text: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::new(format!(
            "No user available to answer: {prompt_text}"
        )))
    }

    fn notify_skipped_action(&self, _action: &ActionData, _reason: &str) {}
}

/// Denies every action (for testing)
#[derive(Clone, Copy)]
pub struct AutoDeny;

impl UserInteractor for AutoDeny {
    fn confirm_action(&self, _action: &ActionData, _prompt_text: &str) -> ApprovalDecision {
        ApprovalDecision::deny("auto-denied")
    }

    fn ask_question(&self, prompt_text: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::new(format!(
            "No user available to answer: {prompt_text}"
        )))
    }

    fn notify_skipped_action(&self, _action: &ActionData, _reason: &str) {}
}

/// No-op progress callback (for testing)
#[derive(Clone, Copy)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_action_start(&self, _index: usize, _total: usize, _action: &ActionData) {}
    fn on_action_complete(&self, _index: usize, _log: &ActionLog) {}
}
