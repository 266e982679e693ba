//! Report rendering: Markdown for people, JSON for tools

use serde_json::Value;

use crate::execution_engine::{ActionStatus, ExecutionReport};

/// Pretty JSON rendering of the report
pub fn format_json(report: &ExecutionReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Markdown rendering of the report
pub fn format_markdown(report: &ExecutionReport) -> String {
    let summary = &report.run_summary;
    let mut out = format!("# Execution Report: {}\n\n", report.plan_title);

    out.push_str(&format!("- **Status:** {}\n", summary.status));
    out.push_str(&format!("- **Started:** {}\n", summary.start_time.to_rfc3339()));
    out.push_str(&format!("- **Finished:** {}\n", summary.end_time.to_rfc3339()));
    out.push_str(&format!("- **Duration:** {} ms\n", summary.duration_ms()));
    if !report.action_logs.is_empty() {
        out.push_str(&format!(
            "- **Actions:** {} succeeded, {} failed, {} skipped\n",
            report.count(ActionStatus::Success),
            report.count(ActionStatus::Failure),
            report.count(ActionStatus::Skipped),
        ));
    }

    if !report.validation_errors.is_empty() {
        out.push_str("\n## Validation Errors\n\n");
        for error in &report.validation_errors {
            push_block(&mut out, "text", error);
        }
    }

    if !report.action_logs.is_empty() {
        out.push_str("\n## Actions\n");
        for (idx, log) in report.action_logs.iter().enumerate() {
            out.push_str(&format!("\n### {}. {} ({})\n\n", idx + 1, log.action_kind, log.status));
            for (key, value) in &log.params {
                if let Value::String(s) = value {
                    if !s.contains('\n') {
                        out.push_str(&format!("- `{key}`: {s}\n"));
                    }
                }
            }
            out.push('\n');
            push_details(&mut out, &log.details);
        }
    }

    if !report.failed_resources.is_empty() {
        out.push_str("\n## Failed Resources\n");
        for (path, content) in &report.failed_resources {
            out.push_str(&format!("\n### {path}\n\n"));
            push_block(&mut out, "", content);
        }
    }

    out
}

fn push_details(out: &mut String, details: &Value) {
    match details {
        Value::Null => {}
        Value::String(text) => push_block(out, "text", text),
        Value::Object(map) if map.contains_key("stdout") => {
            if let Some(code) = map.get("return_code") {
                out.push_str(&format!("Return code: {code}\n\n"));
            }
            for stream in ["stdout", "stderr"] {
                if let Some(text) = map.get(stream).and_then(Value::as_str) {
                    if !text.is_empty() {
                        out.push_str(&format!("{stream}:\n\n"));
                        push_block(out, "text", text);
                    }
                }
            }
        }
        other => {
            let json = serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            push_block(out, "json", &json);
        }
    }
}

/// Fenced block whose fence is longer than any backtick run inside
fn push_block(out: &mut String, lang: &str, body: &str) {
    let fence = "`".repeat(longest_backtick_run(body).max(2) + 1);
    out.push_str(&fence);
    out.push_str(lang);
    out.push('\n');
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence);
    out.push_str("\n\n");
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution_engine::{ActionLog, RunStatus, RunSummary};
    use crate::plan::ActionKind;
    use chrono::Utc;
    use serde_json::{json, Map};
    use std::collections::BTreeMap;

    fn report(logs: Vec<ActionLog>, errors: Vec<String>) -> ExecutionReport {
        let now = Utc::now();
        ExecutionReport {
            plan_title: "Demo".to_string(),
            run_summary: RunSummary {
                status: RunStatus::Failure,
                start_time: now,
                end_time: now,
            },
            action_logs: logs,
            validation_errors: errors,
            failed_resources: BTreeMap::from([("a.txt".to_string(), "has ``` inside".to_string())]),
        }
    }

    #[test]
    fn test_markdown_sections() {
        let mut params = Map::new();
        params.insert("command".to_string(), json!("exit 1"));
        let log = ActionLog::new(
            ActionKind::Execute,
            params,
            ActionStatus::Failure,
            json!({"stdout": "", "stderr": "bad", "return_code": 1}),
        );
        let md = format_markdown(&report(vec![log], vec![]));

        assert!(md.starts_with("# Execution Report: Demo\n"));
        assert!(md.contains("- **Status:** FAILURE"));
        assert!(md.contains("### 1. EXECUTE (FAILURE)"));
        assert!(md.contains("- `command`: exit 1"));
        assert!(md.contains("Return code: 1"));
        assert!(md.contains("stderr:\n\n```text\nbad\n```"));
        assert!(!md.contains("stdout:"));
    }

    #[test]
    fn test_fence_outgrows_content() {
        let md = format_markdown(&report(vec![], vec!["broken".to_string()]));
        assert!(md.contains("## Validation Errors"));
        assert!(md.contains("````\nhas ``` inside\n````"));
    }

    #[test]
    fn test_json_round_trips() {
        let original = report(vec![], vec!["x".to_string()]);
        let json = format_json(&original).unwrap();
        let parsed: ExecutionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
