//! Plain-text extraction from Jira's Atlassian Document Format.
//!
//! API v3 returns descriptions and comment bodies as a recursive tree of
//! nodes; API v2 returns plain strings. Extraction is purely structural: it
//! only looks at `text` and `content` at every level and skips anything
//! malformed instead of failing.

use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;

/// One level of an ADF tree, discriminated by shape rather than node type.
///
/// `content` may be a list of nodes or a single nested node; scalars and
/// anything else that does not fit are ignored wholesale.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocNode {
  Many(Vec<DocNode>),
  Node {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<Box<DocNode>>,
  },
  Other(IgnoredAny),
}

/// Extract flattened plain text from a description-like value.
///
/// A bare string (API v2) is returned as-is without traversal. For a tree,
/// fragments are collected depth-first in document order, trimmed, empties
/// dropped, and joined with single spaces. A result that would be blank is
/// reported as `None`, never as an empty string.
pub fn extract_text(value: &Value) -> Option<String> {
  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }
  if !value.is_object() {
    return None;
  }

  let content = value.get("content")?;
  let root = DocNode::deserialize(content).ok()?;

  let mut fragments = Vec::new();
  collect(&root, &mut fragments);

  if fragments.is_empty() {
    None
  } else {
    Some(fragments.join(" "))
  }
}

fn collect(node: &DocNode, fragments: &mut Vec<String>) {
  match node {
    DocNode::Many(items) => {
      for item in items {
        collect(item, fragments);
      }
    }
    DocNode::Node { text, content } => {
      if let Some(text) = text {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
          fragments.push(trimmed.to_string());
        }
      }
      if let Some(children) = content {
        collect(children, fragments);
      }
    }
    DocNode::Other(_) => {}
  }
}
