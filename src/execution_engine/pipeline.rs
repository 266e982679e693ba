//! Parse → validate → execute
//!
//! Every path through [`run_plan`] ends in an [`ExecutionReport`]; parse and
//! validation failures become VALIDATION_FAILED reports.

use chrono::Utc;
use std::collections::BTreeMap;

use crate::execution_engine::collaborators::FileSystemManager;
use crate::execution_engine::orchestrator::Orchestrator;
use crate::execution_engine::preconditions::{check_path_safety, validate_plan, ValidationError};
use crate::execution_engine::result::ExecutionReport;
use crate::plan::parse_plan;

/// Title used when the document could not be parsed far enough to find one
pub const UNTITLED_PLAN: &str = "Untitled plan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Ask the user before each action
    pub interactive: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions { interactive: true }
    }
}

/// Parse `plan_text`, validate it and, when clean, execute it
pub fn run_plan(
    plan_text: &str,
    options: &PipelineOptions,
    orchestrator: &Orchestrator,
) -> ExecutionReport {
    let start_time = Utc::now();

    let plan = match parse_plan(plan_text) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!("Plan could not be parsed");
            return ExecutionReport::validation_failed(
                UNTITLED_PLAN,
                vec![e.to_string()],
                BTreeMap::new(),
                start_time,
            );
        }
    };

    let fs = orchestrator.dispatcher().fs();
    let errors = validate_plan(&plan, fs);
    if !errors.is_empty() {
        tracing::warn!(errors = errors.len(), "Plan failed validation");
        let failed_resources = collect_failed_resources(&errors, fs);
        return ExecutionReport::validation_failed(
            plan.title.clone(),
            errors.into_iter().map(|e| e.message).collect(),
            failed_resources,
            start_time,
        );
    }

    let mut report = orchestrator.execute(&plan, options.interactive);
    report.run_summary.start_time = start_time;
    report
}

/// Best-effort content of the files named by validation errors
///
/// Paths that are themselves unsafe are never read.
pub fn collect_failed_resources(
    errors: &[ValidationError],
    fs: &dyn FileSystemManager,
) -> BTreeMap<String, String> {
    let mut resources = BTreeMap::new();
    for path in errors.iter().filter_map(|e| e.file_path.as_deref()) {
        if resources.contains_key(path) || !check_path_safety(path).is_empty() {
            continue;
        }
        if !fs.path_exists(path) {
            continue;
        }
        if let Ok(content) = fs.read_file(path) {
            resources.insert(path.to_string(), content);
        }
    }
    resources
}
