//! Approval prompts and the console interactor
//!
//! Provides:
//! - ApprovalRequest: an action awaiting user approval, rendered as a prompt
//! - ApprovalResponse: parsed user answer
//! - ApprovalState: session-scoped "approve all" tracking
//! - ConsoleInteractor: `UserInteractor` over a line-based reader/writer

use serde_json::Value;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Mutex, MutexGuard};

use crate::execution_engine::{ApprovalDecision, CollaboratorError, UserInteractor};
use crate::plan::ActionData;

/// Longest parameter value shown inline
const MAX_INLINE_CHARS: usize = 80;

/// Action awaiting user approval
#[derive(Debug, Clone)]
pub struct ApprovalRequest<'a> {
    /// 1-based position in the plan
    pub index: usize,
    pub total: usize,
    pub action: &'a ActionData,
    /// Diff preview for file-changing actions
    pub preview: Option<String>,
}

impl<'a> ApprovalRequest<'a> {
    pub fn new(index: usize, total: usize, action: &'a ActionData, preview: Option<String>) -> Self {
        Self {
            index,
            total,
            action,
            preview,
        }
    }

    /// Human-readable summary: kind, description, parameters
    pub fn summary(&self) -> String {
        let mut out = format!("Action {}/{}: {}\n", self.index, self.total, self.action.kind());
        if let Some(ref description) = self.action.description {
            out.push_str(&format!("  Description: {description}\n"));
        }
        for (key, value) in self.action.params() {
            out.push_str(&format!("  {key}: {}\n", summarize_value(&value)));
        }
        out
    }

    /// Format approval prompt for console display
    pub fn format_prompt(&self) -> String {
        let mut prompt = String::new();
        if let Some(ref preview) = self.preview {
            prompt.push_str(preview);
            if !preview.ends_with('\n') {
                prompt.push('\n');
            }
        }
        prompt.push_str(&self.summary());
        prompt.push_str("  [y=approve, a=approve all, n=deny]");
        prompt
    }
}

fn summarize_value(value: &Value) -> String {
    match value {
        Value::String(s) => summarize_text(s),
        Value::Array(items) => {
            let inline: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(summarize_text))
                .collect();
            if inline.len() == items.len() && !items.is_empty() {
                inline.join(", ")
            } else {
                format!("{} item(s)", items.len())
            }
        }
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", v.as_str().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

fn summarize_text(text: &str) -> String {
    let line_count = text.lines().count();
    let first = text.lines().next().unwrap_or_default();
    let mut shown: String = first.chars().take(MAX_INLINE_CHARS).collect();
    if shown.len() < first.len() {
        shown.push_str("...");
    }
    if line_count > 1 {
        format!("{shown} ({line_count} lines)")
    } else {
        shown
    }
}

/// Approval response parsed from console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalResponse {
    Approve,
    /// Approve this and every later action
    ApproveAll,
    /// Deny, with an optional inline reason (`n not now`)
    Deny(Option<String>),
}

/// Parse a console answer; `None` if unrecognized
pub fn parse_response(line: &str) -> Option<ApprovalResponse> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(ApprovalResponse::Approve),
        "a" | "all" => Some(ApprovalResponse::ApproveAll),
        "n" | "no" => Some(ApprovalResponse::Deny(
            Some(rest.to_string()).filter(|r| !r.is_empty()),
        )),
        _ => None,
    }
}

/// Session-scoped approval state
#[derive(Debug, Clone, Default)]
pub struct ApprovalState {
    pub approved_all: bool,
}

/// Interactive console front end
pub struct ConsoleInteractor {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
    state: Mutex<ApprovalState>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ConsoleInteractor {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            state: Mutex::new(ApprovalState::default()),
        }
    }

    /// Prompts on stderr, answers from stdin
    pub fn stdio() -> Self {
        Self::new(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stderr()),
        )
    }

    fn say(&self, text: &str) {
        let mut out = lock(&self.output);
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }

    fn ask(&self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut out = lock(&self.output);
            write!(out, "{prompt}")?;
            out.flush()?;
        }
        let mut line = String::new();
        let read = lock(&self.input).read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl UserInteractor for ConsoleInteractor {
    fn confirm_action(&self, _action: &ActionData, prompt_text: &str) -> ApprovalDecision {
        self.say(prompt_text);
        if lock(&self.state).approved_all {
            self.say("  (approved: approve all)");
            return ApprovalDecision::approve();
        }

        loop {
            let line = match self.ask("> ") {
                Ok(Some(line)) => line,
                Ok(None) => return ApprovalDecision::deny("no answer (input closed)"),
                Err(e) => return ApprovalDecision::deny(format!("failed to read answer: {e}")),
            };
            match parse_response(&line) {
                Some(ApprovalResponse::Approve) => return ApprovalDecision::approve(),
                Some(ApprovalResponse::ApproveAll) => {
                    lock(&self.state).approved_all = true;
                    return ApprovalDecision::approve();
                }
                Some(ApprovalResponse::Deny(Some(reason))) => return ApprovalDecision::deny(reason),
                Some(ApprovalResponse::Deny(None)) => {
                    let reason = self.ask("Reason (optional): ").ok().flatten().unwrap_or_default();
                    return ApprovalDecision::deny(reason.trim());
                }
                None => self.say("Please answer y, a or n."),
            }
        }
    }

    fn ask_question(&self, prompt_text: &str) -> Result<String, CollaboratorError> {
        self.say(prompt_text);
        match self.ask("> ") {
            Ok(Some(answer)) => Ok(answer),
            Ok(None) => Err(CollaboratorError::new(
                "Input closed before an answer was given",
            )),
            Err(e) => Err(CollaboratorError::from_display(e)),
        }
    }

    fn notify_skipped_action(&self, action: &ActionData, reason: &str) {
        self.say(&format!("Skipped {}: {reason}", action.kind()));
    }
}
