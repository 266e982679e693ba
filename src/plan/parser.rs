//! Plan parser
//!
//! Single forward pass over the top-level nodes of a plan document:
//!
//! ```text
//! [preamble...]
//! # Title
//! - metadata list
//! ## Rationale        + code block
//! ## Memos            + code block   (optional)
//! ## Action Plan
//! ### `KIND`          + per-kind body, repeated
//! ```
//!
//! Skeleton violations produce a structural error with a marked trace of the
//! document; every other error gets a numbered trace and a hint appended.

use tracing::debug;

use crate::plan::actions::parse_action;
use crate::plan::document::{parse_document, Node};
use crate::plan::errors::InvalidPlanError;
use crate::plan::metadata::strip_markup;
use crate::plan::{ActionData, ActionKind, Plan};

/// Hint appended to non-structural errors
pub const NESTED_FENCE_HINT: &str = "Hint: improperly nested code fences are a common cause of this error. \
An outer fence must use more backticks than any fence it contains \
(for example, wrap content that itself contains ``` in a ```` fence).";

/// Peekable cursor over top-level nodes
pub struct NodeStream<'a> {
    nodes: &'a [Node],
    pos: usize,
}

impl<'a> NodeStream<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        NodeStream { nodes, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a Node> {
        self.nodes.get(self.pos)
    }

    pub fn next_node(&mut self) -> Option<&'a Node> {
        let node = self.nodes.get(self.pos)?;
        self.pos += 1;
        Some(node)
    }

    /// Index of the node `peek` would return
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True at stream end or at a heading that closes the current action
    pub fn at_action_boundary(&self) -> bool {
        match self.peek() {
            None => true,
            Some(node) => matches!(node.heading_level(), Some(level) if level <= 3),
        }
    }

    /// Take the next node if it satisfies `pred`
    pub fn next_if(&mut self, pred: impl Fn(&Node) -> bool) -> Option<&'a Node> {
        match self.peek() {
            Some(node) if pred(node) => self.next_node(),
            _ => None,
        }
    }

    pub fn nodes(&self) -> &'a [Node] {
        self.nodes
    }
}

/// Parse a plan document
pub fn parse_plan(source: &str) -> Result<Plan, InvalidPlanError> {
    let nodes = parse_document(source);
    debug!(nodes = nodes.len(), "parsed plan document tree");

    parse_nodes(&nodes).map_err(|err| {
        if err.is_structural() {
            err
        } else {
            InvalidPlanError::grammar(format!(
                "{}\n\n{}\n\n{}",
                err.message,
                render_trace(&nodes, None),
                NESTED_FENCE_HINT
            ))
        }
    })
}

fn parse_nodes(nodes: &[Node]) -> Result<Plan, InvalidPlanError> {
    let mut stream = NodeStream::new(nodes);

    // Preamble: everything before the first level-1 heading
    while stream.peek().is_some_and(|node| !node.is_heading(1)) {
        stream.next_node();
    }
    let title_node = stream.next_node().ok_or_else(|| {
        InvalidPlanError::structure(format!(
            "Invalid plan structure: expected a Level 1 heading (the plan title), but the document has none.\n\n{}",
            render_trace(nodes, None)
        ))
    })?;
    let title = strip_markup(&title_node.text);
    debug!(title = %title, "found plan title");

    expect(&mut stream, "List (plan metadata)", |node| node.is_list())?;
    expect(&mut stream, "Level 2 heading containing 'Rationale'", |node| {
        node.is_heading(2) && node.text.contains("Rationale")
    })?;
    expect(&mut stream, "Code block (rationale)", |node| node.is_code_block())?;

    if stream
        .peek()
        .is_some_and(|node| node.is_heading(2) && node.text.contains("Memos"))
    {
        stream.next_node();
        expect(&mut stream, "Code block (memos)", |node| node.is_code_block())?;
    }

    expect(&mut stream, "Level 2 heading containing 'Action Plan'", |node| {
        node.is_heading(2) && node.text.contains("Action Plan")
    })?;

    let mut actions: Vec<ActionData> = Vec::new();
    while stream.peek().is_some() {
        let heading = expect(&mut stream, "Level 3 heading (action type)", |node| {
            node.is_heading(3)
        })?;
        let name = strip_markup(&heading.text);
        let kind = ActionKind::from_name(&name)
            .ok_or_else(|| InvalidPlanError::grammar(format!("Unknown action type: {}", name)))?;

        let action = parse_action(kind, &mut stream).map_err(|err| {
            InvalidPlanError::grammar(format!(
                "Invalid {} action (#{}): {}",
                kind,
                actions.len() + 1,
                err.message
            ))
        })?;
        debug!(kind = %kind, index = actions.len(), "parsed action");
        actions.push(action);
    }

    Plan::new(title, actions)
        .map_err(|err| InvalidPlanError::grammar(format!("{}: the 'Action Plan' section is empty", err)))
}

/// Consume the next node or fail with a structural error
fn expect<'a>(
    stream: &mut NodeStream<'a>,
    expected: &str,
    pred: impl Fn(&Node) -> bool,
) -> Result<&'a Node, InvalidPlanError> {
    let position = stream.position();
    match stream.peek() {
        Some(node) if pred(node) => {
            stream.next_node();
            Ok(node)
        }
        Some(node) => Err(structure_error(stream.nodes(), position, expected, &node.describe())),
        None => Err(structure_error(
            stream.nodes(),
            position,
            expected,
            "end of document",
        )),
    }
}

fn structure_error(nodes: &[Node], position: usize, expected: &str, found: &str) -> InvalidPlanError {
    InvalidPlanError::structure(format!(
        "Invalid plan structure: expected {}, but found {}.\n\n{}",
        expected,
        found,
        render_trace(nodes, Some(position))
    ))
}

/// Numbered listing of the document's top-level nodes
///
/// With `marker`, the node at that index (or the end of the document) is
/// flagged as the error position.
pub fn render_trace(nodes: &[Node], marker: Option<usize>) -> String {
    let mut out = String::from("Document structure:\n");
    for (idx, node) in nodes.iter().enumerate() {
        let flag = if marker == Some(idx) { ">>" } else { "  " };
        out.push_str(&format!("{} [{}] {}\n", flag, idx, node.describe()));
        if marker == Some(idx) {
            out.push_str("      ^-- error here\n");
        }
    }
    if marker.is_some_and(|idx| idx >= nodes.len()) {
        out.push_str(">> [end of document]\n      ^-- error here\n");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "# Plan\n\n- **Status:** Green\n\n## Rationale\n```text\nWhy.\n```\n\n## Action Plan\n\n";

    #[test]
    fn test_minimal_plan() {
        let doc = format!("{}### `READ`\n- **Resource:** [a](/a.txt)\n", HEADER);
        let plan = parse_plan(&doc).expect("plan should parse");
        assert_eq!(plan.title, "Plan");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.actions()[0].kind(), ActionKind::Read);
    }

    #[test]
    fn test_missing_title() {
        let err = parse_plan("Just some text\n\n- item\n").unwrap_err();
        assert!(err.is_structural());
        assert!(err.message.contains("Level 1 heading"));
    }

    #[test]
    fn test_structural_error_marks_position() {
        let doc = "# Plan\n\n- meta\n\nUnexpected paragraph\n";
        let err = parse_plan(doc).unwrap_err();
        assert!(err.message.contains("expected Level 2 heading containing 'Rationale'"));
        assert!(err.message.contains("found Paragraph \"Unexpected paragraph\""));
        assert!(err.message.contains(">> [2] Paragraph"));
    }

    #[test]
    fn test_unknown_action_type_gets_trace_and_hint() {
        let doc = format!("{}### `DELETE`\n- **Resource:** [a](/a)\n", HEADER);
        let err = parse_plan(&doc).unwrap_err();
        assert!(!err.is_structural());
        assert!(err.message.starts_with("Unknown action type: DELETE"));
        assert!(err.message.contains("Document structure:"));
        assert!(err.message.contains(NESTED_FENCE_HINT));
    }

    #[test]
    fn test_memos_section_is_optional() {
        let doc = "# Plan\n\n- meta\n\n## Rationale\n```\nr\n```\n\n## Memos\n```\nm\n```\n\n## Action Plan\n\n### RETURN\nDone.\n";
        let plan = parse_plan(doc).expect("plan should parse");
        assert_eq!(plan.actions()[0].kind(), ActionKind::Return);
    }

    #[test]
    fn test_empty_action_plan_is_rejected() {
        let err = parse_plan(HEADER).unwrap_err();
        assert!(err.message.contains("at least one action"));
    }
}
