//! Action metadata lists
//!
//! An action's metadata is a bullet list of `**Key:** value` items. Keys are
//! compared case-insensitively with markup and the trailing colon removed.

use crate::plan::document::{ListItem, Node};
use crate::plan::paths::normalize_link_path;
use std::collections::BTreeMap;

/// Key aliases for a local file target
pub const PATH_KEYS: &[&str] = &["file path", "path", "file"];

/// Key aliases for a READ / PRUNE resource
pub const RESOURCE_KEYS: &[&str] = &["resource", "source", "file path", "path", "url"];

/// Key of the nested handoff link list used by INVOKE / RETURN
pub const HANDOFF_KEY: &str = "handoff resources";

/// One `Key: value` entry
#[derive(Debug, Clone)]
pub struct MetadataEntry<'a> {
    pub key: String,
    pub value: String,
    pub item: &'a ListItem,
}

/// Parsed metadata list
#[derive(Debug, Clone, Default)]
pub struct Metadata<'a> {
    entries: Vec<MetadataEntry<'a>>,
}

impl<'a> Metadata<'a> {
    /// Read the metadata entries of a list node
    pub fn from_list(node: &'a Node) -> Self {
        let entries = node.items.iter().filter_map(parse_entry).collect();
        Metadata { entries }
    }

    pub fn get(&self, keys: &[&str]) -> Option<&MetadataEntry<'a>> {
        keys.iter()
            .find_map(|key| self.entries.iter().find(|entry| entry.key == *key))
    }

    /// Non-empty text value for the first matching key
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        self.get(keys)
            .map(|entry| strip_markup(&entry.value))
            .filter(|value| !value.is_empty())
    }

    /// Normalized link target for the first matching key
    ///
    /// Falls back to the plain value when the item carries no link.
    pub fn link(&self, keys: &[&str]) -> Option<String> {
        let entry = self.get(keys)?;
        let raw = match entry.item.links.first() {
            Some(link) if !link.dest.trim().is_empty() => link.dest.clone(),
            _ => strip_markup(&entry.value),
        };
        if raw.trim().is_empty() {
            None
        } else {
            Some(normalize_link_path(&raw))
        }
    }

    pub fn description(&self) -> Option<String> {
        self.text(&["description"])
    }
}

fn parse_entry(item: &ListItem) -> Option<MetadataEntry<'_>> {
    let (key, value) = item.text.split_once(':')?;
    let key = normalize_key(key);
    if key.is_empty() {
        return None;
    }
    Some(MetadataEntry {
        key,
        value: value.trim().to_string(),
        item,
    })
}

/// Lowercased key without markup or trailing colon
pub fn normalize_key(raw: &str) -> String {
    strip_markup(raw)
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
}

/// Remove surrounding emphasis / code markup from a short text
pub fn strip_markup(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '*' || c == '_' || c == '`')
        .trim()
        .to_string()
}

/// `KEY: value` pairs of a nested list (EXECUTE `env`)
pub fn key_value_children(item: &ListItem) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for child in &item.children {
        let split_at = child.text.find([':', '=']);
        if let Some(idx) = split_at {
            let (key, value) = (&child.text[..idx], &child.text[idx + 1..]);
            let key = strip_markup(key);
            if !key.is_empty() {
                pairs.insert(key, unquote(&strip_markup(value)));
            }
        }
    }
    pairs
}

/// Link targets of an item and its nested items (handoff resources)
pub fn link_targets(item: &ListItem) -> Vec<String> {
    let mut targets: Vec<String> = item
        .links
        .iter()
        .map(|link| normalize_link_path(&link.dest))
        .collect();
    for child in &item.children {
        targets.extend(link_targets(child));
    }
    targets
}

/// Strip one pair of matching surrounding quotes
pub fn unquote(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}
