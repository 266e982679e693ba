//! Document tree builder
//!
//! Folds the `pulldown-cmark` event stream into a flat list of top-level
//! block nodes. Lists keep their items (with nested sub-items and links);
//! every node keeps the exact source slice it was parsed from so that
//! free-form content can be re-rendered verbatim.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::fmt;
use std::ops::Range;

/// Number of characters shown in node previews
pub const PREVIEW_CHARS: usize = 30;

/// Kind of a top-level block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Heading(u8),
    Paragraph,
    List,
    CodeBlock { info: String },
    BlockQuote,
    Table,
    Html,
    ThematicBreak,
    Other,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Heading(level) => write!(f, "Level {} heading", level),
            NodeKind::Paragraph => f.write_str("Paragraph"),
            NodeKind::List => f.write_str("List"),
            NodeKind::CodeBlock { .. } => f.write_str("Code block"),
            NodeKind::BlockQuote => f.write_str("Block quote"),
            NodeKind::Table => f.write_str("Table"),
            NodeKind::Html => f.write_str("HTML block"),
            NodeKind::ThematicBreak => f.write_str("Thematic break"),
            NodeKind::Other => f.write_str("Other block"),
        }
    }
}

/// Inline link found inside a list item
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Link {
    pub text: String,
    pub dest: String,
}

/// List item with its inline text, links and nested items
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub text: String,
    pub links: Vec<Link>,
    pub children: Vec<ListItem>,
}

/// Top-level block node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Plain text content (markup removed)
    pub text: String,
    /// Exact source slice of the block
    pub source: String,
    /// Items, for `NodeKind::List`
    pub items: Vec<ListItem>,
}

impl Node {
    pub fn is_heading(&self, level: u8) -> bool {
        self.kind == NodeKind::Heading(level)
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Heading(level) => Some(level),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        self.kind == NodeKind::List
    }

    pub fn is_code_block(&self) -> bool {
        matches!(self.kind, NodeKind::CodeBlock { .. })
    }

    /// Single-line preview of the node's text, truncated to [`PREVIEW_CHARS`]
    pub fn preview(&self) -> String {
        let flat: String = self
            .text
            .trim()
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        if flat.chars().count() > PREVIEW_CHARS {
            let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", cut)
        } else {
            flat
        }
    }

    /// Kind plus preview, e.g. `Level 2 heading "Rationale"`
    pub fn describe(&self) -> String {
        format!("{} \"{}\"", self.kind, self.preview())
    }
}

/// Parse a document into its top-level block nodes
pub fn parse_document(source: &str) -> Vec<Node> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut nodes = Vec::new();
    let mut builder: Option<NodeBuilder> = None;
    let mut depth = 0usize;

    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    builder = Some(NodeBuilder::new(kind_of(&tag), range));
                }
                depth += 1;
                if let Some(b) = builder.as_mut() {
                    b.start(&tag);
                }
            }
            Event::End(tag_end) => {
                depth = depth.saturating_sub(1);
                if let Some(b) = builder.as_mut() {
                    b.end(tag_end);
                }
                if depth == 0 {
                    if let Some(b) = builder.take() {
                        nodes.push(b.finish(source));
                    }
                }
            }
            Event::Rule if depth == 0 => {
                nodes.push(Node {
                    kind: NodeKind::ThematicBreak,
                    text: String::new(),
                    source: slice(source, &range),
                    items: Vec::new(),
                });
            }
            Event::Html(html) if depth == 0 => {
                nodes.push(Node {
                    kind: NodeKind::Html,
                    text: html.to_string(),
                    source: slice(source, &range),
                    items: Vec::new(),
                });
            }
            other => {
                if let Some(b) = builder.as_mut() {
                    b.inline(other);
                }
            }
        }
    }

    nodes
}

fn kind_of(tag: &Tag<'_>) -> NodeKind {
    match tag {
        Tag::Heading { level, .. } => NodeKind::Heading(*level as u8),
        Tag::Paragraph => NodeKind::Paragraph,
        Tag::List(_) => NodeKind::List,
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => NodeKind::CodeBlock {
            info: info.to_string(),
        },
        Tag::CodeBlock(CodeBlockKind::Indented) => NodeKind::CodeBlock {
            info: String::new(),
        },
        Tag::BlockQuote(_) => NodeKind::BlockQuote,
        Tag::Table(_) => NodeKind::Table,
        Tag::HtmlBlock => NodeKind::Html,
        _ => NodeKind::Other,
    }
}

fn slice(source: &str, range: &Range<usize>) -> String {
    source.get(range.clone()).unwrap_or_default().to_string()
}

/// Accumulates the events of one top-level block
struct NodeBuilder {
    kind: NodeKind,
    range: Range<usize>,
    text: String,
    items: Vec<ListItem>,
    item_stack: Vec<ListItem>,
    link: Option<Link>,
}

impl NodeBuilder {
    fn new(kind: NodeKind, range: Range<usize>) -> Self {
        NodeBuilder {
            kind,
            range,
            text: String::new(),
            items: Vec::new(),
            item_stack: Vec::new(),
            link: None,
        }
    }

    fn start(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Item => self.item_stack.push(ListItem::default()),
            Tag::Link { dest_url, .. } => {
                self.link = Some(Link {
                    text: String::new(),
                    dest: dest_url.to_string(),
                });
            }
            _ => {}
        }
    }

    fn end(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Item => {
                if let Some(mut item) = self.item_stack.pop() {
                    item.text = item.text.trim().to_string();
                    match self.item_stack.last_mut() {
                        Some(parent) => parent.children.push(item),
                        None => self.items.push(item),
                    }
                }
                self.push_text("\n");
            }
            TagEnd::Link => {
                if let Some(link) = self.link.take() {
                    if let Some(item) = self.item_stack.last_mut() {
                        item.links.push(link);
                    }
                }
            }
            TagEnd::Paragraph if !self.item_stack.is_empty() => self.push_text("\n"),
            _ => {}
        }
    }

    fn inline(&mut self, event: Event<'_>) {
        match event {
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak | Event::HardBreak => self.push_text("\n"),
            Event::InlineHtml(html) | Event::Html(html) => self.push_text(&html),
            Event::TaskListMarker(done) => self.push_text(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        if let Some(item) = self.item_stack.last_mut() {
            item.text.push_str(text);
        }
        if let Some(link) = self.link.as_mut() {
            link.text.push_str(text);
        }
    }

    fn finish(self, source: &str) -> Node {
        let text = if matches!(self.kind, NodeKind::CodeBlock { .. }) {
            self.text
        } else {
            self.text.trim().to_string()
        };
        Node {
            kind: self.kind,
            text,
            source: slice(source, &self.range),
            items: self.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_blocks() {
        let doc = "# Title\n\n- a\n- b\n\n## Section\n\n```text\nbody\n```\n\nSome text.\n";
        let nodes = parse_document(doc);

        let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Heading(1),
                NodeKind::List,
                NodeKind::Heading(2),
                NodeKind::CodeBlock {
                    info: "text".to_string()
                },
                NodeKind::Paragraph,
            ]
        );
        assert_eq!(nodes[0].text, "Title");
        assert_eq!(nodes[3].text, "body\n");
    }

    #[test]
    fn test_list_items_keep_links_and_children() {
        let doc = "- **File Path:** [main.rs](/src/main.rs)\n- **env:**\n    - `KEY`: `value`\n";
        let nodes = parse_document(doc);
        assert_eq!(nodes.len(), 1);

        let items = &nodes[0].items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "File Path: main.rs");
        assert_eq!(items[0].links[0].dest, "/src/main.rs");
        assert_eq!(items[0].links[0].text, "main.rs");
        assert_eq!(items[1].text, "env:");
        assert_eq!(items[1].children[0].text, "KEY: value");
    }

    #[test]
    fn test_nested_fences_stay_one_block() {
        let doc = "````markdown\n```rust\nfn main() {}\n```\n````\n";
        let nodes = parse_document(doc);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_code_block());
        assert_eq!(nodes[0].text, "```rust\nfn main() {}\n```\n");
    }

    #[test]
    fn test_preview_is_truncated() {
        let doc = "This paragraph is definitely longer than thirty characters.\n";
        let nodes = parse_document(doc);
        assert_eq!(nodes[0].preview(), "This paragraph is definitely l...");
    }
}
