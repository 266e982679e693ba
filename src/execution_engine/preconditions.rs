//! Pre-flight validation of a parsed plan
//!
//! Runs before any side effect. Every action is checked and every defect is
//! collected, so an operator sees the full list in one pass. Only read
//! access to the filesystem is used.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::execution_engine::collaborators::FileSystemManager;
use crate::plan::paths::looks_absolute;
use crate::plan::{is_url, Action, ActionData, EditPair, Plan};

/// One pre-flight defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    /// File the defect refers to, when there is one
    pub file_path: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, file_path: Option<&str>) -> Self {
        ValidationError {
            message: message.into(),
            file_path: file_path.map(str::to_string),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validate every action of `plan` against the filesystem
///
/// An empty result means the plan may proceed to execution.
pub fn validate_plan(plan: &Plan, fs: &dyn FileSystemManager) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (idx, action) in plan.actions().iter().enumerate() {
        let found = validate_action(action, fs);
        if !found.is_empty() {
            tracing::debug!(
                action = idx + 1,
                kind = %action.kind(),
                errors = found.len(),
                "Validation failed for action"
            );
        }
        errors.extend(found);
    }
    errors
}

/// Validate a single action
pub fn validate_action(action: &ActionData, fs: &dyn FileSystemManager) -> Vec<ValidationError> {
    match &action.action {
        Action::Create { path, .. } => check_create(path, fs),
        Action::Edit { path, edits } => check_edit(path, edits, fs),
        Action::Read { resource } if !is_url(resource) => check_path_safety(resource),
        Action::Read { .. }
        | Action::Execute { .. }
        | Action::Research { .. }
        | Action::ChatWithUser { .. }
        | Action::Prune { .. }
        | Action::Invoke { .. }
        | Action::Return { .. } => Vec::new(),
    }
}

/// Reject absolute paths and `..` segments
pub fn check_path_safety(path: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if is_absolute(path) {
        errors.push(ValidationError::new(
            format!("Absolute paths are not allowed (use a project-relative path): {path}"),
            Some(path),
        ));
    }
    if has_parent_segment(path) {
        errors.push(ValidationError::new(
            format!("Path must not contain '..' segments: {path}"),
            Some(path),
        ));
    }
    errors
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || looks_absolute(path)
        || Path::new(path).is_absolute()
}

fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

fn check_create(path: &str, fs: &dyn FileSystemManager) -> Vec<ValidationError> {
    let errors = check_path_safety(path);
    if !errors.is_empty() {
        return errors;
    }
    if fs.path_exists(path) {
        return vec![ValidationError::new(
            format!("Cannot CREATE {path}: file already exists"),
            Some(path),
        )];
    }
    Vec::new()
}

fn check_edit(path: &str, edits: &[EditPair], fs: &dyn FileSystemManager) -> Vec<ValidationError> {
    let mut errors = check_path_safety(path);
    if !errors.is_empty() {
        return errors;
    }

    if !fs.path_exists(path) {
        errors.push(ValidationError::new(
            format!("Cannot EDIT {path}: file does not exist"),
            Some(path),
        ));
        return errors;
    }

    let mut content = match fs.read_file(path) {
        Ok(content) => content,
        Err(e) => {
            errors.push(ValidationError::new(
                format!("Cannot EDIT {path}: {e}"),
                Some(path),
            ));
            return errors;
        }
    };

    // Pairs apply in sequence, so each one is checked against the content
    // left by the pairs before it.
    for (idx, edit) in edits.iter().enumerate() {
        let n = idx + 1;
        if edit.find.is_empty() {
            errors.push(ValidationError::new(
                format!("Edit #{n} for {path}: FIND text is empty"),
                Some(path),
            ));
            continue;
        }
        if edit.find == edit.replace {
            errors.push(ValidationError::new(
                format!("Edit #{n} for {path}: FIND and REPLACE text are identical"),
                Some(path),
            ));
            continue;
        }
        match content.matches(edit.find.as_str()).count() {
            0 => errors.push(ValidationError::new(
                format!("Edit #{n} for {path}: FIND text not found in file"),
                Some(path),
            )),
            1 => content = content.replacen(&edit.find, &edit.replace, 1),
            count => errors.push(ValidationError::new(
                format!(
                    "Edit #{n} for {path}: FIND text is ambiguous, found {count} matches (it must match exactly once)"
                ),
                Some(path),
            )),
        }
    }

    errors
}
