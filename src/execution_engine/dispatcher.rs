//! Dispatcher: routes one action to its collaborator
//!
//! Selection is an exhaustive match on the action payload. Collaborator
//! output is normalized to a JSON value and classified:
//! - collaborator error → FAILURE, the error text becomes `details`
//! - shell result with non-zero return code → FAILURE
//! - anything else → SUCCESS

use serde_json::{json, Value};

use crate::execution_engine::collaborators::{
    CollaboratorError, ContentFetcher, FileSystemManager, ShellOutput, ShellRunner,
    UserInteractor, WebSearcher,
};
use crate::execution_engine::result::{ActionLog, ActionStatus};
use crate::plan::{is_url, Action, ActionData, ActionKind};

/// Raw collaborator output before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutput {
    /// Bare text (file content, fetched page, chat answer)
    Text(String),
    /// Already structured result
    Structured(Value),
    /// Shell command result
    Shell(ShellOutput),
}

/// Normalize collaborator output and classify it
pub fn normalize(kind: ActionKind, output: DispatchOutput) -> (ActionStatus, Value) {
    match output {
        DispatchOutput::Text(text) => {
            let value = if kind == ActionKind::ChatWithUser {
                json!({ "response": text })
            } else {
                json!({ "content": text })
            };
            (ActionStatus::Success, value)
        }
        DispatchOutput::Structured(Value::String(text)) => {
            normalize(kind, DispatchOutput::Text(text))
        }
        DispatchOutput::Structured(value) => (ActionStatus::Success, value),
        DispatchOutput::Shell(output) => {
            let status = if output.return_code == 0 {
                ActionStatus::Success
            } else {
                ActionStatus::Failure
            };
            let value = json!({
                "stdout": output.stdout,
                "stderr": output.stderr,
                "return_code": output.return_code,
            });
            (status, value)
        }
    }
}

/// Owns the collaborators and invokes them for single actions
pub struct Dispatcher {
    fs: Box<dyn FileSystemManager>,
    shell: Box<dyn ShellRunner>,
    fetcher: Box<dyn ContentFetcher>,
    searcher: Box<dyn WebSearcher>,
    interactor: Box<dyn UserInteractor>,
}

impl Dispatcher {
    pub fn new(
        fs: Box<dyn FileSystemManager>,
        shell: Box<dyn ShellRunner>,
        fetcher: Box<dyn ContentFetcher>,
        searcher: Box<dyn WebSearcher>,
        interactor: Box<dyn UserInteractor>,
    ) -> Self {
        Dispatcher {
            fs,
            shell,
            fetcher,
            searcher,
            interactor,
        }
    }

    pub fn fs(&self) -> &dyn FileSystemManager {
        self.fs.as_ref()
    }

    pub fn interactor(&self) -> &dyn UserInteractor {
        self.interactor.as_ref()
    }

    /// Run one action and produce its log entry
    ///
    /// Never fails: collaborator errors are recorded as FAILURE.
    pub fn dispatch(&self, action: &ActionData) -> ActionLog {
        let kind = action.kind();
        let params = action.params();

        let (status, details) = match self.invoke(&action.action) {
            Ok(output) => normalize(kind, output),
            Err(e) => (ActionStatus::Failure, Value::String(e.to_string())),
        };

        match status {
            ActionStatus::Failure => tracing::warn!(kind = %kind, "Action failed"),
            _ => tracing::info!(kind = %kind, status = %status, "Action dispatched"),
        }

        ActionLog::new(kind, params, status, details)
    }

    fn invoke(&self, action: &Action) -> Result<DispatchOutput, CollaboratorError> {
        match action {
            Action::Create { path, content } => {
                self.fs.create_file(path, content)?;
                Ok(DispatchOutput::Structured(json!({
                    "message": format!("Created {path}"),
                    "bytes": content.len(),
                })))
            }
            Action::Read { resource } if is_url(resource) => {
                self.fetcher.get_content(resource).map(DispatchOutput::Text)
            }
            Action::Read { resource } => self.fs.read_file(resource).map(DispatchOutput::Text),
            Action::Edit { path, edits } => {
                let applied = self.fs.edit_file(path, edits)?;
                Ok(DispatchOutput::Structured(json!({
                    "message": format!("Applied {applied} edit(s) to {path}"),
                    "edits_applied": applied,
                })))
            }
            Action::Execute {
                command, cwd, env, ..
            } => self
                .shell
                .execute(command, cwd.as_deref(), env)
                .map(DispatchOutput::Shell),
            Action::Research { queries } => {
                self.searcher.search(queries).map(DispatchOutput::Structured)
            }
            Action::ChatWithUser { prompt } => {
                self.interactor.ask_question(prompt).map(DispatchOutput::Text)
            }
            Action::Prune { resource } => Ok(DispatchOutput::Structured(json!({
                "message": format!("Pruned {resource} from context"),
            }))),
            Action::Invoke {
                agent,
                message,
                handoff_resources,
            } => Ok(DispatchOutput::Structured(json!({
                "agent": agent,
                "message": message,
                "handoff_resources": handoff_resources,
            }))),
            Action::Return {
                message,
                handoff_resources,
            } => Ok(DispatchOutput::Structured(json!({
                "message": message,
                "handoff_resources": handoff_resources,
            }))),
        }
    }
}
