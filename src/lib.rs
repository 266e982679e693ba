//! planrun: execute declarative Markdown action plans
//!
//! A plan document is parsed into typed actions, checked against the
//! filesystem before anything runs, then executed in order under an
//! approval protocol that halts on the first failure.

pub mod cli;
pub mod config;
pub mod execution_engine;
pub mod file_edit_tools;
pub mod file_tools;
pub mod os_tools;
pub mod plan;
pub mod report;
pub mod ui;
pub mod web_tools;

// Re-export the pipeline surface
pub use execution_engine::{
    run_plan, validate_plan, ActionLog, ActionStatus, Dispatcher, ExecutionReport, Orchestrator,
    PipelineOptions, RunStatus, ValidationError,
};
pub use plan::{parse_plan, Action, ActionData, ActionKind, EditPair, InvalidPlanError, Plan};
