//! Plan types: ActionKind, Action payloads, ActionData, Plan
//!
//! A plan is produced once by the parser and is read-only afterwards.
//! Each action kind carries its own payload shape; there is no untyped
//! parameter bag until a report asks for one via [`ActionData::params`].

pub mod actions;
pub mod document;
pub mod errors;
pub mod metadata;
pub mod parser;
pub mod paths;

pub use document::{parse_document, Link, ListItem, Node, NodeKind};
pub use errors::{InvalidPlanError, PlanConstructionError};
pub use parser::parse_plan;
pub use paths::{is_url, normalize_link_path};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of action kinds a plan may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Create,
    Read,
    Edit,
    Execute,
    Research,
    ChatWithUser,
    Prune,
    Invoke,
    Return,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Create,
        ActionKind::Read,
        ActionKind::Edit,
        ActionKind::Execute,
        ActionKind::Research,
        ActionKind::ChatWithUser,
        ActionKind::Prune,
        ActionKind::Invoke,
        ActionKind::Return,
    ];

    /// Keyword used in action headings
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "CREATE",
            ActionKind::Read => "READ",
            ActionKind::Edit => "EDIT",
            ActionKind::Execute => "EXECUTE",
            ActionKind::Research => "RESEARCH",
            ActionKind::ChatWithUser => "CHAT_WITH_USER",
            ActionKind::Prune => "PRUNE",
            ActionKind::Invoke => "INVOKE",
            ActionKind::Return => "RETURN",
        }
    }

    /// Exact (case-sensitive) keyword lookup
    pub fn from_name(name: &str) -> Option<ActionKind> {
        ActionKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Kinds whose target is a local file the executor writes to
    pub fn mutates_file(&self) -> bool {
        matches!(self, ActionKind::Create | ActionKind::Edit)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One FIND/REPLACE pair of an EDIT action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPair {
    pub find: String,
    pub replace: String,
}

/// Per-kind action payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Create {
        path: String,
        content: String,
    },
    Read {
        resource: String,
    },
    Edit {
        path: String,
        edits: Vec<EditPair>,
    },
    Execute {
        command: String,
        cwd: Option<String>,
        env: BTreeMap<String, String>,
        expected_outcome: Option<String>,
    },
    Research {
        queries: Vec<String>,
    },
    ChatWithUser {
        prompt: String,
    },
    Prune {
        resource: String,
    },
    Invoke {
        agent: String,
        message: String,
        handoff_resources: Vec<String>,
    },
    Return {
        message: String,
        handoff_resources: Vec<String>,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Create { .. } => ActionKind::Create,
            Action::Read { .. } => ActionKind::Read,
            Action::Edit { .. } => ActionKind::Edit,
            Action::Execute { .. } => ActionKind::Execute,
            Action::Research { .. } => ActionKind::Research,
            Action::ChatWithUser { .. } => ActionKind::ChatWithUser,
            Action::Prune { .. } => ActionKind::Prune,
            Action::Invoke { .. } => ActionKind::Invoke,
            Action::Return { .. } => ActionKind::Return,
        }
    }
}

/// A parsed action: payload plus optional human description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub action: Action,
}

impl ActionData {
    pub fn new(action: Action, description: Option<String>) -> Self {
        ActionData {
            description,
            action,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    /// Local file targeted by CREATE / EDIT (READ and PRUNE resources are not included)
    pub fn target_path(&self) -> Option<&str> {
        match &self.action {
            Action::Create { path, .. } | Action::Edit { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Parameters as an ordered map, keyed the way reports expect
    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        match &self.action {
            Action::Create { path, content } => {
                params.insert("path".into(), json!(path));
                params.insert("content".into(), json!(content));
            }
            Action::Read { resource } | Action::Prune { resource } => {
                params.insert("resource".into(), json!(resource));
            }
            Action::Edit { path, edits } => {
                params.insert("path".into(), json!(path));
                params.insert("edits".into(), json!(edits));
            }
            Action::Execute {
                command,
                cwd,
                env,
                expected_outcome,
            } => {
                params.insert("command".into(), json!(command));
                if let Some(cwd) = cwd {
                    params.insert("cwd".into(), json!(cwd));
                }
                if !env.is_empty() {
                    params.insert("env".into(), json!(env));
                }
                if let Some(outcome) = expected_outcome {
                    params.insert("expected_outcome".into(), json!(outcome));
                }
            }
            Action::Research { queries } => {
                params.insert("queries".into(), json!(queries));
            }
            Action::ChatWithUser { prompt } => {
                params.insert("prompt".into(), json!(prompt));
            }
            Action::Invoke {
                agent,
                message,
                handoff_resources,
            } => {
                params.insert("agent".into(), json!(agent));
                params.insert("message".into(), json!(message));
                params.insert("handoff_resources".into(), json!(handoff_resources));
            }
            Action::Return {
                message,
                handoff_resources,
            } => {
                params.insert("message".into(), json!(message));
                params.insert("handoff_resources".into(), json!(handoff_resources));
            }
        }
        params
    }
}

/// Parsed plan: a title and a non-empty, ordered list of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub title: String,
    actions: Vec<ActionData>,
}

impl Plan {
    /// Build a plan; an empty action list is a construction error
    pub fn new(
        title: impl Into<String>,
        actions: Vec<ActionData>,
    ) -> Result<Self, PlanConstructionError> {
        if actions.is_empty() {
            return Err(PlanConstructionError::NoActions);
        }
        Ok(Plan {
            title: title.into(),
            actions,
        })
    }

    pub fn actions(&self) -> &[ActionData] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
