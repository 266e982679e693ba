//! CLI command dispatch
//!
//! - execute: parse, validate and run a plan, then print the report
//! - validate: parse and validate only
//! - parse: print the parsed plan as JSON

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::cli::logging::init_logging;
use crate::cli::root::resolve_root;
use crate::cli::{
    Cli, Command, Error, ExecuteArgs, Result, ValidateArgs, EXIT_FAILURE, EXIT_SUCCESS,
    EXIT_USAGE_ERROR,
};
use crate::config::Config;
use crate::execution_engine::{
    run_plan, validate_plan, Dispatcher, ExecutionReport, Orchestrator, PipelineOptions,
};
use crate::file_tools::LocalFileSystem;
use crate::os_tools::LocalShellRunner;
use crate::plan::parse_plan;
use crate::report::{format_json, format_markdown};
use crate::ui::{ConsoleInteractor, ConsoleProgress};
use crate::web_tools::{HttpFetcher, HttpSearcher};

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Run the parsed command line and return the process exit code
pub fn run_cli(cli: Cli) -> ExitCode {
    match run_command(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_USAGE_ERROR
        }
    }
}

fn run_command(cli: Cli) -> Result<ExitCode> {
    let root = match &cli.command {
        Command::Execute(args) => resolve_root(args.root.clone())?,
        Command::Validate(args) => resolve_root(args.root.clone())?,
        Command::Parse { .. } => resolve_root(None)?,
    };
    let config = Config::load(&root, cli.config.as_deref())?;
    let _log_guard = init_logging(&config.logging, cli.verbose, cli.log_json)?;
    tracing::debug!(root = %root.display(), "Resolved project root");

    match cli.command {
        Command::Execute(args) => run_execute(&root, &config, args),
        Command::Validate(args) => run_validate(&root, args),
        Command::Parse { plan } => run_parse(&plan),
    }
}

/// Read a plan from a file, or from stdin for `-`
pub fn read_plan_source(plan: &str) -> Result<String> {
    if plan == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    let path = PathBuf::from(plan);
    if !path.is_file() {
        return Err(Error::InvalidArgs(format!("Plan file not found: {}", plan)));
    }
    Ok(fs::read_to_string(&path)?)
}

/// Wire the real collaborators for `root`
pub fn build_orchestrator(root: &Path, config: &Config) -> Result<Orchestrator> {
    let dispatcher = Dispatcher::new(
        Box::new(LocalFileSystem::new(root)),
        Box::new(LocalShellRunner::new(root, config.shell.timeout())),
        Box::new(HttpFetcher::new(&config.web)?),
        Box::new(HttpSearcher::new(&config.web)?),
        Box::new(ConsoleInteractor::stdio()),
    );
    Ok(Orchestrator::new(dispatcher, Box::new(ConsoleProgress::stderr())))
}

fn render(report: &ExecutionReport, json: bool) -> Result<String> {
    if json {
        Ok(format_json(report)?)
    } else {
        Ok(format_markdown(report))
    }
}

fn run_execute(root: &Path, config: &Config, args: ExecuteArgs) -> Result<ExitCode> {
    let text = read_plan_source(&args.plan)?;
    let orchestrator = build_orchestrator(root, config)?;
    let options = PipelineOptions {
        interactive: config.execution.interactive && !args.yes,
    };

    let report = run_plan(&text, &options, &orchestrator);

    println!("{}", render(&report, args.json)?);

    if let Some(ref path) = args.report {
        let as_json = path.extension().is_some_and(|ext| ext == "json");
        fs::write(path, render(&report, as_json)?)?;
        tracing::info!(path = %path.display(), "Report written");
    }

    Ok(config.execution.exit_policy().exit_code(report.status()))
}

fn run_validate(root: &Path, args: ValidateArgs) -> Result<ExitCode> {
    let text = read_plan_source(&args.plan)?;
    let plan = match parse_plan(&text) {
        Ok(plan) => plan,
        Err(e) => {
            if args.json {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": [{ "message": e.to_string(), "file_path": null }],
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", e);
            }
            return Ok(EXIT_FAILURE);
        }
    };

    let fs = LocalFileSystem::new(root);
    let errors = validate_plan(&plan, &fs);

    if args.json {
        let output = serde_json::json!({
            "title": plan.title,
            "actions": plan.len(),
            "valid": errors.is_empty(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if errors.is_empty() {
        println!("Plan '{}' is valid ({} actions)", plan.title, plan.len());
    } else {
        println!("Plan '{}' has {} problem(s):", plan.title, errors.len());
        for error in &errors {
            println!("  - {}", error);
        }
    }

    Ok(if errors.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}

fn run_parse(plan: &str) -> Result<ExitCode> {
    let text = read_plan_source(plan)?;
    match parse_plan(&text) {
        Ok(plan) => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(EXIT_FAILURE)
        }
    }
}
