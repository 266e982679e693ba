//! Plan parser integration tests
//!
//! Tests cover:
//! - Every action kind parsed from one document, in order
//! - Verbatim CREATE content and EDIT pairs
//! - EXECUTE metadata and shell prelude folding
//! - Structural and grammar errors with their traces
//! - Link path normalization

use planrun::{parse_plan, Action, ActionKind, EditPair};

const HEADER: &str = "\
# Refactor the widget module

- **Status:** Green
- **Owner:** build team

## Rationale
```text
The widget module needs a second constructor.
```

## Action Plan

";

fn plan_with(body: &str) -> String {
    format!("{}{}", HEADER, body)
}

const FULL_PLAN_BODY: &str = r#"### `READ`
- **Resource:** [widget](/src/widget.rs)
- **Description:** Load the current module

### `CREATE`
- **File Path:** [new](/src/widget/builder.rs)
- **Description:** Add the builder

```rust
pub struct Builder;

impl Builder {
    pub fn new() -> Self {
        Builder
    }
}
```

### `EDIT`
- **File Path:** [widget](/src/widget.rs)

#### FIND:
```rust
pub fn new() -> Widget {
```

#### REPLACE:
```rust
pub fn with_size(size: u32) -> Widget {
```

#### FIND:
```rust
mod tests;
```

#### REPLACE:
```rust
mod builder;
mod tests;
```

### `EXECUTE`
- **Description:** Run the widget tests
- **cwd:** crates
- **env:**
  - RUST_BACKTRACE: 1
- **Expected Outcome:** All tests pass

```bash
cd widget
export CARGO_TERM_COLOR=never
cargo test --quiet
```

### `RESEARCH`
- **Description:** Builder pattern references

```text
rust builder pattern
```

```text
rust default trait
```

### `CHAT_WITH_USER`
Should the builder validate sizes eagerly?

### `PRUNE`
- **Resource:** [widget](/src/widget.rs)

### `INVOKE`
- **Agent:** reviewer
- **Description:** Ask for a review

Please review the builder.

- Handoff Resources:
  - [builder](/src/widget/builder.rs)

### `RETURN`
The builder is in place.

- Handoff Resources:
  - [widget](/src/widget.rs)
"#;

#[test]
fn test_full_plan_parses_every_kind_in_order() {
    let plan = parse_plan(&plan_with(FULL_PLAN_BODY)).expect("Failed to parse plan");

    assert_eq!(plan.title, "Refactor the widget module");
    let kinds: Vec<ActionKind> = plan.actions().iter().map(|a| a.kind()).collect();
    assert_eq!(kinds, ActionKind::ALL.to_vec());
}

#[test]
fn test_read_and_prune_resources() {
    let plan = parse_plan(&plan_with(FULL_PLAN_BODY)).expect("Failed to parse plan");

    let read = &plan.actions()[0];
    assert_eq!(read.description.as_deref(), Some("Load the current module"));
    assert_eq!(
        read.action,
        Action::Read {
            resource: "src/widget.rs".to_string()
        }
    );
    assert_eq!(
        plan.actions()[6].action,
        Action::Prune {
            resource: "src/widget.rs".to_string()
        }
    );
}

#[test]
fn test_create_content_is_verbatim() {
    let plan = parse_plan(&plan_with(FULL_PLAN_BODY)).expect("Failed to parse plan");

    match &plan.actions()[1].action {
        Action::Create { path, content } => {
            assert_eq!(path, "src/widget/builder.rs");
            assert_eq!(
                content,
                "pub struct Builder;\n\nimpl Builder {\n    pub fn new() -> Self {\n        Builder\n    }\n}\n"
            );
        }
        other => panic!("expected CREATE, got {other:?}"),
    }
}

#[test]
fn test_edit_pairs_keep_order() {
    let plan = parse_plan(&plan_with(FULL_PLAN_BODY)).expect("Failed to parse plan");

    match &plan.actions()[2].action {
        Action::Edit { path, edits } => {
            assert_eq!(path, "src/widget.rs");
            assert_eq!(
                edits,
                &vec![
                    EditPair {
                        find: "pub fn new() -> Widget {".to_string(),
                        replace: "pub fn with_size(size: u32) -> Widget {".to_string(),
                    },
                    EditPair {
                        find: "mod tests;".to_string(),
                        replace: "mod builder;\nmod tests;".to_string(),
                    },
                ]
            );
        }
        other => panic!("expected EDIT, got {other:?}"),
    }
}

#[test]
fn test_execute_metadata_and_prelude() {
    let plan = parse_plan(&plan_with(FULL_PLAN_BODY)).expect("Failed to parse plan");

    let execute = &plan.actions()[3];
    assert_eq!(execute.description.as_deref(), Some("Run the widget tests"));
    match &execute.action {
        Action::Execute {
            command,
            cwd,
            env,
            expected_outcome,
        } => {
            assert_eq!(command, "cargo test --quiet");
            assert_eq!(cwd.as_deref(), Some("crates/widget"));
            assert_eq!(env.get("RUST_BACKTRACE").map(String::as_str), Some("1"));
            assert_eq!(env.get("CARGO_TERM_COLOR").map(String::as_str), Some("never"));
            assert_eq!(expected_outcome.as_deref(), Some("All tests pass"));
        }
        other => panic!("expected EXECUTE, got {other:?}"),
    }
}

#[test]
fn test_research_chat_invoke_return() {
    let plan = parse_plan(&plan_with(FULL_PLAN_BODY)).expect("Failed to parse plan");
    let actions = plan.actions();

    assert_eq!(
        actions[4].action,
        Action::Research {
            queries: vec![
                "rust builder pattern".to_string(),
                "rust default trait".to_string()
            ]
        }
    );
    assert_eq!(
        actions[5].action,
        Action::ChatWithUser {
            prompt: "Should the builder validate sizes eagerly?".to_string()
        }
    );
    assert_eq!(
        actions[7].action,
        Action::Invoke {
            agent: "reviewer".to_string(),
            message: "Please review the builder.".to_string(),
            handoff_resources: vec!["src/widget/builder.rs".to_string()],
        }
    );
    assert_eq!(
        actions[8].action,
        Action::Return {
            message: "The builder is in place.".to_string(),
            handoff_resources: vec!["src/widget.rs".to_string()],
        }
    );
}

#[test]
fn test_params_are_keyed_for_reports() {
    let plan = parse_plan(&plan_with(FULL_PLAN_BODY)).expect("Failed to parse plan");

    let params = plan.actions()[3].params();
    let keys: Vec<&str> = params.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["command", "cwd", "env", "expected_outcome"]);
}

#[test]
fn test_missing_title_is_structural_error() {
    let err = parse_plan("Just some prose.\n\n- a list\n").expect_err("plan without title");
    assert!(err.is_structural());
    assert!(err.to_string().contains("Level 1 heading"), "got: {err}");
}

#[test]
fn test_missing_rationale_is_reported_with_position() {
    let doc = "# Plan\n\n- **Status:** Green\n\n## Action Plan\n\n### `RETURN`\nDone.\n";
    let err = parse_plan(doc).expect_err("plan without rationale");
    let message = err.to_string();
    assert!(message.contains("Rationale"), "got: {message}");
}

#[test]
fn test_unknown_action_type() {
    let err = parse_plan(&plan_with("### `DELETE`\n- **File Path:** [x](/x)\n"))
        .expect_err("unknown action");
    assert!(!err.is_structural());
    assert!(err.to_string().contains("Unknown action type: DELETE"), "got: {err}");
}

#[test]
fn test_invalid_action_names_kind_and_position() {
    let body = "### `READ`\n- **Resource:** [a](/a.txt)\n\n### `CREATE`\n- **File Path:** [b](/b.txt)\n";
    let err = parse_plan(&plan_with(body)).expect_err("CREATE without content");
    let message = err.to_string();
    assert!(message.contains("Invalid CREATE action (#2)"), "got: {message}");
    assert!(message.contains("code block"), "got: {message}");
}

#[test]
fn test_edit_without_replace_is_rejected() {
    let body = "### `EDIT`\n- **File Path:** [a](/a.txt)\n\n#### FIND:\n```\nx\n```\n";
    let err = parse_plan(&plan_with(body)).expect_err("EDIT without REPLACE");
    assert!(err.to_string().contains("Invalid EDIT action (#1)"), "got: {err}");
}

#[test]
fn test_link_paths_are_normalized() {
    let body = "\
### `READ`
- **Resource:** [spaced](/docs/My%20Notes.md)

### `READ`
- **Resource:** [abs](/home/user/secret.txt)

### `READ`
- **Resource:** [web](https://example.com/page)
";
    let plan = parse_plan(&plan_with(body)).expect("Failed to parse plan");
    let resources: Vec<String> = plan
        .actions()
        .iter()
        .map(|a| match &a.action {
            Action::Read { resource } => resource.clone(),
            other => panic!("expected READ, got {other:?}"),
        })
        .collect();
    assert_eq!(
        resources,
        vec![
            "docs/My Notes.md".to_string(),
            "/home/user/secret.txt".to_string(),
            "https://example.com/page".to_string(),
        ]
    );
}
