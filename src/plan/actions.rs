//! Per-action sub-parsers
//!
//! Each sub-parser consumes exactly the nodes that belong to one action and
//! stops at the next heading of level 1-3 or at the end of the document.
//! Errors returned here are wrapped by the plan parser with the action kind
//! and position.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::plan::document::Node;
use crate::plan::errors::InvalidPlanError;
use crate::plan::metadata::{
    key_value_children, link_targets, normalize_key, strip_markup, unquote, Metadata,
    HANDOFF_KEY, PATH_KEYS, RESOURCE_KEYS,
};
use crate::plan::parser::NodeStream;
use crate::plan::{Action, ActionData, ActionKind, EditPair};

type ParseResult<T> = Result<T, InvalidPlanError>;

/// Dispatch to the sub-parser for `kind`
pub fn parse_action(kind: ActionKind, stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    match kind {
        ActionKind::Create => parse_create(stream),
        ActionKind::Read => parse_resource_action(stream, ActionKind::Read),
        ActionKind::Edit => parse_edit(stream),
        ActionKind::Execute => parse_execute(stream),
        ActionKind::Research => parse_research(stream),
        ActionKind::ChatWithUser => parse_chat(stream),
        ActionKind::Prune => parse_resource_action(stream, ActionKind::Prune),
        ActionKind::Invoke => parse_invoke(stream),
        ActionKind::Return => parse_return(stream),
    }
}

fn invalid(message: impl Into<String>) -> InvalidPlanError {
    InvalidPlanError::grammar(message)
}

fn found(stream: &NodeStream<'_>) -> String {
    match stream.peek() {
        Some(node) => node.describe(),
        None => "end of document".to_string(),
    }
}

/// The metadata list directly under the action heading
fn metadata_list<'a>(stream: &mut NodeStream<'a>) -> ParseResult<&'a Node> {
    if stream.at_action_boundary() {
        return Err(invalid(format!(
            "expected a metadata list, but found {}",
            found(stream)
        )));
    }
    stream.next_if(|node| node.is_list()).ok_or_else(|| {
        invalid(format!(
            "expected a metadata list, but found {}",
            found(stream)
        ))
    })
}

fn code_block<'a>(stream: &mut NodeStream<'a>, what: &str) -> ParseResult<&'a Node> {
    if stream.at_action_boundary() {
        return Err(invalid(format!(
            "expected a code block ({}), but found {}",
            what,
            found(stream)
        )));
    }
    stream.next_if(|node| node.is_code_block()).ok_or_else(|| {
        invalid(format!(
            "expected a code block ({}), but found {}",
            what,
            found(stream)
        ))
    })
}

/// Code block body without its final line terminator
fn chomp(text: &str) -> String {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
        .to_string()
}

fn parse_create(stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    let list = metadata_list(stream)?;
    let meta = Metadata::from_list(list);
    let path = meta
        .link(PATH_KEYS)
        .ok_or_else(|| invalid("missing 'File Path' link in metadata list"))?;
    let content = code_block(stream, "file content")?.text.clone();

    Ok(ActionData::new(
        Action::Create { path, content },
        meta.description(),
    ))
}

fn parse_resource_action(stream: &mut NodeStream<'_>, kind: ActionKind) -> ParseResult<ActionData> {
    let list = metadata_list(stream)?;
    let meta = Metadata::from_list(list);
    let resource = meta
        .link(RESOURCE_KEYS)
        .ok_or_else(|| invalid("missing 'Resource' link in metadata list"))?;

    let action = match kind {
        ActionKind::Prune => Action::Prune { resource },
        _ => Action::Read { resource },
    };
    Ok(ActionData::new(action, meta.description()))
}

fn is_marker_heading(node: &Node, marker: &str) -> bool {
    matches!(node.heading_level(), Some(level) if level >= 4)
        && strip_markup(&node.text)
            .trim_end_matches(':')
            .eq_ignore_ascii_case(marker)
}

fn parse_edit(stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    let list = metadata_list(stream)?;
    let meta = Metadata::from_list(list);
    let path = meta
        .link(PATH_KEYS)
        .ok_or_else(|| invalid("missing 'File Path' link in metadata list"))?;

    let mut edits = Vec::new();
    while !stream.at_action_boundary() {
        let pair_no = edits.len() + 1;
        stream
            .next_if(|node| is_marker_heading(node, "FIND"))
            .ok_or_else(|| {
                invalid(format!(
                    "expected a 'FIND:' heading for edit #{}, but found {}",
                    pair_no,
                    found(stream)
                ))
            })?;
        let find = chomp(&code_block(stream, "FIND text")?.text);

        if stream.at_action_boundary() {
            return Err(invalid(format!(
                "edit #{} has a FIND block but no 'REPLACE:' heading",
                pair_no
            )));
        }
        stream
            .next_if(|node| is_marker_heading(node, "REPLACE"))
            .ok_or_else(|| {
                invalid(format!(
                    "expected a 'REPLACE:' heading for edit #{}, but found {}",
                    pair_no,
                    found(stream)
                ))
            })?;
        let replace = chomp(&code_block(stream, "REPLACE text")?.text);

        edits.push(EditPair { find, replace });
    }

    if edits.is_empty() {
        return Err(invalid("at least one FIND/REPLACE pair is required"));
    }

    Ok(ActionData::new(Action::Edit { path, edits }, meta.description()))
}

fn cd_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^cd\s+([^;&|]+?)\s*$").expect("valid regex"))
}

fn export_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^export\s+([A-Za-z_][A-Za-z0-9_]*)=([^;&|]*?)\s*$").expect("valid regex")
    })
}

/// Command with leading `cd` / `export` lines folded into cwd / env
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellPrelude {
    pub command: String,
    pub cwd: Option<String>,
    pub env: BTreeMap<String, String>,
}

/// Values the shell would expand cannot be folded literally
fn needs_shell(value: &str) -> bool {
    let value = value.trim();
    value.contains('$') || value.contains('`') || value.starts_with('~')
}

/// Extract leading `cd <dir>` and `export KEY=value` lines from a command
///
/// A `cd` is resolved against the cwd accumulated so far. Folding stops at
/// the first line that is neither, or whose value needs shell expansion
/// (`$VAR`, backticks, `~`); that line and the rest are kept verbatim.
pub fn extract_shell_prelude(command: &str, cwd: Option<String>) -> ShellPrelude {
    let mut cwd = cwd;
    let mut env = BTreeMap::new();
    let lines: Vec<&str> = command.lines().collect();
    let mut consumed = 0;

    for line in &lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            consumed += 1;
            continue;
        }
        if let Some(caps) = cd_regex().captures(trimmed) {
            if needs_shell(&caps[1]) {
                break;
            }
            let dir = unquote(&caps[1]);
            cwd = Some(match cwd {
                Some(base) if !dir.starts_with('/') && base != "." => {
                    format!("{}/{}", base.trim_end_matches('/'), dir)
                }
                _ => dir,
            });
            consumed += 1;
        } else if let Some(caps) = export_regex().captures(trimmed) {
            if needs_shell(&caps[2]) {
                break;
            }
            env.insert(caps[1].to_string(), unquote(&caps[2]));
            consumed += 1;
        } else {
            break;
        }
    }

    ShellPrelude {
        command: lines[consumed..].join("\n").trim().to_string(),
        cwd,
        env,
    }
}

fn parse_execute(stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    let list = metadata_list(stream)?;
    let meta = Metadata::from_list(list);

    let declared_cwd = meta.text(&["cwd", "working directory"]);
    let mut env = meta
        .get(&["env", "environment"])
        .map(|entry| key_value_children(entry.item))
        .unwrap_or_default();

    let block = code_block(stream, "shell command")?;
    let prelude = extract_shell_prelude(&block.text, declared_cwd);
    if prelude.command.is_empty() {
        return Err(invalid(
            "the command block is empty once leading 'cd' / 'export' lines are removed",
        ));
    }
    env.extend(prelude.env);

    Ok(ActionData::new(
        Action::Execute {
            command: prelude.command,
            cwd: prelude.cwd,
            env,
            expected_outcome: meta.text(&["expected outcome"]),
        },
        meta.description(),
    ))
}

fn parse_research(stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    let list = metadata_list(stream)?;
    let meta = Metadata::from_list(list);

    let mut queries = Vec::new();
    while !stream.at_action_boundary() {
        let block = code_block(stream, "search query")?;
        let query = block.text.trim().to_string();
        if !query.is_empty() {
            queries.push(query);
        }
    }
    if queries.is_empty() {
        return Err(invalid("at least one query code block is required"));
    }

    Ok(ActionData::new(Action::Research { queries }, meta.description()))
}

/// Free-form content up to the next action, split from any handoff list
struct MessageBody {
    message: String,
    handoff_resources: Vec<String>,
}

fn is_handoff_list(node: &Node) -> bool {
    node.is_list()
        && node.items.first().is_some_and(|item| {
            item.text
                .split_once(':')
                .map(|(key, _)| normalize_key(key) == HANDOFF_KEY)
                .unwrap_or_else(|| normalize_key(&item.text) == HANDOFF_KEY)
        })
}

fn message_body(stream: &mut NodeStream<'_>) -> MessageBody {
    let mut parts: Vec<&str> = Vec::new();
    let mut handoff_resources = Vec::new();

    while !stream.at_action_boundary() {
        let Some(node) = stream.next_node() else {
            break;
        };
        if is_handoff_list(node) {
            for item in &node.items {
                handoff_resources.extend(link_targets(item));
            }
        } else {
            parts.push(node.source.trim_end());
        }
    }

    MessageBody {
        message: parts.join("\n\n").trim().to_string(),
        handoff_resources,
    }
}

fn parse_chat(stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    let mut parts: Vec<&str> = Vec::new();
    while !stream.at_action_boundary() {
        if let Some(node) = stream.next_node() {
            parts.push(node.source.trim_end());
        }
    }
    let prompt = parts.join("\n\n").trim().to_string();
    if prompt.is_empty() {
        return Err(invalid("a prompt is required"));
    }
    Ok(ActionData::new(Action::ChatWithUser { prompt }, None))
}

fn parse_invoke(stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    let list = metadata_list(stream)?;
    let meta = Metadata::from_list(list);
    let agent = meta
        .text(&["agent"])
        .ok_or_else(|| invalid("missing 'Agent' field in metadata list"))?;

    let mut handoff_resources: Vec<String> = meta
        .get(&[HANDOFF_KEY])
        .map(|entry| link_targets(entry.item))
        .unwrap_or_default();
    let body = message_body(stream);
    handoff_resources.extend(body.handoff_resources);

    Ok(ActionData::new(
        Action::Invoke {
            agent,
            message: body.message,
            handoff_resources,
        },
        meta.description(),
    ))
}

fn parse_return(stream: &mut NodeStream<'_>) -> ParseResult<ActionData> {
    let body = message_body(stream);
    if body.message.is_empty() {
        return Err(invalid("a message is required"));
    }
    Ok(ActionData::new(
        Action::Return {
            message: body.message,
            handoff_resources: body.handoff_resources,
        },
        None,
    ))
}
