//! Before/after preview for CREATE and EDIT approvals

use crate::execution_engine::FileSystemManager;
use crate::plan::{Action, ActionData, EditPair};

/// Lines shown per block before eliding the rest
pub const MAX_PREVIEW_LINES: usize = 40;

/// Preview of what the action will change, if it changes a file
pub fn render_preview(action: &ActionData, fs: &dyn FileSystemManager) -> Option<String> {
    if !action.kind().mutates_file() {
        return None;
    }
    match &action.action {
        Action::Create { path, content } => Some(create_preview(path, content)),
        Action::Edit { path, edits } => {
            let current = fs.read_file(path).ok();
            Some(edit_preview(path, current.as_deref(), edits))
        }
        _ => None,
    }
}

pub fn create_preview(path: &str, content: &str) -> String {
    let mut out = format!("--- /dev/null\n+++ {path}\n");
    push_lines(&mut out, '+', content);
    out
}

/// Preview edits as -/+ hunks; line numbers are shown when `current` is known
pub fn edit_preview(path: &str, current: Option<&str>, edits: &[EditPair]) -> String {
    let mut out = format!("--- {path}\n+++ {path}\n");
    let mut content = current.map(str::to_string);

    for (idx, edit) in edits.iter().enumerate() {
        let line = content
            .as_deref()
            .and_then(|c| c.find(&edit.find).map(|at| c[..at].matches('\n').count() + 1));
        match line {
            Some(line) => out.push_str(&format!("@@ edit #{} at line {} @@\n", idx + 1, line)),
            None => out.push_str(&format!("@@ edit #{} @@\n", idx + 1)),
        }
        push_lines(&mut out, '-', &edit.find);
        push_lines(&mut out, '+', &edit.replace);

        if let Some(c) = content.as_mut() {
            *c = c.replacen(&edit.find, &edit.replace, 1);
        }
    }
    out
}

fn push_lines(out: &mut String, marker: char, text: &str) {
    let lines: Vec<&str> = text.lines().collect();
    for line in lines.iter().take(MAX_PREVIEW_LINES) {
        out.push(marker);
        out.push_str(line);
        out.push('\n');
    }
    if lines.len() > MAX_PREVIEW_LINES {
        out.push_str(&format!(
            "{marker}... ({} more lines)\n",
            lines.len() - MAX_PREVIEW_LINES
        ));
    }
}
