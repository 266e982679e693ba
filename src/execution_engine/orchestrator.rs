//! Orchestrator: runs a validated plan action by action
//!
//! Per action, in plan order:
//! - halted → SKIPPED without prompting or dispatching
//! - interactive (except CHAT_WITH_USER) → ask for approval; a decline is
//!   SKIPPED and does not halt the run
//! - otherwise dispatch; the first FAILURE halts every later action

use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::execution_engine::collaborators::ProgressCallback;
use crate::execution_engine::dispatcher::Dispatcher;
use crate::execution_engine::result::{
    ActionLog, ActionStatus, ExecutionReport, RunStatus, RunSummary,
};
use crate::plan::{ActionData, ActionKind, Plan};
use crate::ui::approval::ApprovalRequest;
use crate::ui::diff_preview::render_preview;

/// Reason recorded for actions skipped after a failure
pub const HALTED_REASON: &str = "halted by a previous failure";

/// Reason recorded when the user declines without giving one
pub const DECLINED_REASON: &str = "declined by user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Halted,
}

pub struct Orchestrator {
    dispatcher: Dispatcher,
    progress: Box<dyn ProgressCallback>,
}

impl Orchestrator {
    pub fn new(dispatcher: Dispatcher, progress: Box<dyn ProgressCallback>) -> Self {
        Orchestrator {
            dispatcher,
            progress,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Execute every action of `plan` and assemble the report
    ///
    /// Execution errors are recorded in the logs, never returned.
    pub fn execute(&self, plan: &Plan, interactive: bool) -> ExecutionReport {
        let start_time = Utc::now();
        let total = plan.len();
        let mut state = RunState::Running;
        let mut action_logs = Vec::with_capacity(total);
        let mut failed_resources = BTreeMap::new();

        tracing::info!(title = %plan.title, actions = total, interactive, "Executing plan");

        for (idx, action) in plan.actions().iter().enumerate() {
            let index = idx + 1;
            self.progress.on_action_start(index, total, action);

            let log = match state {
                RunState::Halted => {
                    self.dispatcher
                        .interactor()
                        .notify_skipped_action(action, HALTED_REASON);
                    skipped(action, HALTED_REASON)
                }
                RunState::Running => {
                    match self.approve(index, total, action, interactive) {
                        Err(reason) => {
                            tracing::warn!(action = index, kind = %action.kind(), %reason, "Action declined");
                            skipped(action, &reason)
                        }
                        Ok(()) => {
                            let mut log = self.dispatcher.dispatch(action);
                            if log.is_failure() {
                                self.attach_file_content(action, &mut log, &mut failed_resources);
                                tracing::warn!(action = index, "Halting remaining actions");
                                state = RunState::Halted;
                            }
                            log
                        }
                    }
                }
            };

            self.progress.on_action_complete(index, &log);
            action_logs.push(log);
        }

        let status = RunStatus::from_actions(action_logs.iter().map(|log| &log.status));
        tracing::info!(status = %status, "Plan finished");

        ExecutionReport {
            plan_title: plan.title.clone(),
            run_summary: RunSummary {
                status,
                start_time,
                end_time: Utc::now(),
            },
            action_logs,
            validation_errors: Vec::new(),
            failed_resources,
        }
    }

    /// Ok when the action may run, Err(reason) when the user declined
    fn approve(
        &self,
        index: usize,
        total: usize,
        action: &ActionData,
        interactive: bool,
    ) -> Result<(), String> {
        // CHAT_WITH_USER is itself an exchange with the user
        if !interactive || action.kind() == ActionKind::ChatWithUser {
            return Ok(());
        }

        let diff = render_preview(action, self.dispatcher.fs());
        let prompt = ApprovalRequest::new(index, total, action, diff).format_prompt();
        let decision = self.dispatcher.interactor().confirm_action(action, &prompt);

        if decision.approved {
            Ok(())
        } else if decision.reason.trim().is_empty() {
            Err(DECLINED_REASON.to_string())
        } else {
            Err(decision.reason.trim().to_string())
        }
    }

    /// Best-effort: record the current content of a CREATE/EDIT target
    fn attach_file_content(
        &self,
        action: &ActionData,
        log: &mut ActionLog,
        failed_resources: &mut BTreeMap<String, String>,
    ) {
        if !action.kind().mutates_file() {
            return;
        }
        let Some(path) = action.target_path() else {
            return;
        };
        let Ok(content) = self.dispatcher.fs().read_file(path) else {
            return;
        };

        let mut details = match std::mem::take(&mut log.details) {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("error".to_string(), other);
                map
            }
        };
        details.insert("file_content".to_string(), json!(content));
        log.details = Value::Object(details);
        failed_resources.insert(path.to_string(), content);
    }
}

fn skipped(action: &ActionData, reason: &str) -> ActionLog {
    ActionLog::new(
        action.kind(),
        action.params(),
        ActionStatus::Skipped,
        json!({ "reason": reason }),
    )
}
