//! Flattening of raw Jira issue documents into response types.
//!
//! Raw documents are untyped `serde_json::Value` trees; every lookup here is
//! null-safe and returns absent when an intermediate level is missing or not
//! an object.

use serde_json::Value;

use super::adf;
use super::types::{Attachment, Comment, Issue};

const EMPTY: &[Value] = &[];

/// Derive the flat issue shape from a raw upstream document.
pub fn issue_from_document(document: &Value) -> Issue {
  let fields = document.get("fields").unwrap_or(&Value::Null);
  let rendered = document.get("renderedFields").unwrap_or(&Value::Null);
  let issue_key = document
    .get("key")
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string();

  Issue {
    summary: nested_str(fields, &["summary"]),
    description: description(fields, rendered),
    status: nested_str(fields, &["status", "name"]),
    issue_type: nested_str(fields, &["issuetype", "name"]),
    priority: nested_str(fields, &["priority", "name"]),
    assignee: nested_str(fields, &["assignee", "displayName"]),
    reporter: nested_str(fields, &["reporter", "displayName"]),
    created: nested_str(fields, &["created"]),
    updated: nested_str(fields, &["updated"]),
    comments: comments(fields, rendered),
    attachments: attachments(fields, &issue_key),
    issue_key,
  }
}

/// Locate a raw attachment entry by string-compared identifier.
pub fn find_attachment<'a>(document: &'a Value, attachment_id: &str) -> Option<&'a Value> {
  attachment_list(document.get("fields").unwrap_or(&Value::Null))
    .iter()
    .find(|item| attachment_id_of(item).as_deref() == Some(attachment_id))
}

/// Attachment ids arrive as JSON strings or numbers; both compare as text.
pub fn attachment_id_of(attachment: &Value) -> Option<String> {
  match attachment.get("id") {
    Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
    Some(Value::Number(n)) => Some(n.to_string()),
    _ => None,
  }
}

/// Walk `path` through nested objects, absent if any level is missing,
/// null, or not an object.
fn nested<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
  let mut current = value;
  for key in path {
    current = current.as_object()?.get(*key)?;
    if current.is_null() {
      return None;
    }
  }
  Some(current)
}

fn nested_str(value: &Value, path: &[&str]) -> Option<String> {
  nested(value, path)
    .and_then(Value::as_str)
    .map(str::to_string)
}

/// Prefer the rendered (HTML) description when present and non-blank, else
/// extract plain text from the raw ADF tree.
fn description(fields: &Value, rendered: &Value) -> Option<String> {
  if let Some(html) = rendered.get("description").and_then(Value::as_str) {
    if !html.trim().is_empty() {
      return Some(html.to_string());
    }
  }
  fields.get("description").and_then(adf::extract_text)
}

/// Pair raw and rendered comment lists positionally. Comments beyond the
/// rendered list's length fall back to ADF extraction of the raw body.
fn comments(fields: &Value, rendered: &Value) -> Vec<Comment> {
  let raw = nested(fields, &["comment", "comments"])
    .and_then(Value::as_array)
    .map_or(EMPTY, Vec::as_slice);
  let rendered = nested(rendered, &["comment", "comments"])
    .and_then(Value::as_array)
    .map_or(EMPTY, Vec::as_slice);

  raw
    .iter()
    .enumerate()
    .map(|(idx, comment)| {
      let rendered_body = rendered
        .get(idx)
        .and_then(|c| c.get("body"))
        .and_then(Value::as_str)
        .filter(|body| !body.is_empty());

      Comment {
        author: nested_str(comment, &["author", "displayName"]),
        body: rendered_body
          .map(str::to_string)
          .or_else(|| comment.get("body").and_then(adf::extract_text)),
        created: nested_str(comment, &["created"]),
      }
    })
    .collect()
}

fn attachments(fields: &Value, issue_key: &str) -> Vec<Attachment> {
  attachment_list(fields)
    .iter()
    .map(|attachment| Attachment {
      filename: nested_str(attachment, &["filename"]),
      size: attachment.get("size").and_then(Value::as_u64),
      mime_type: nested_str(attachment, &["mimeType"]),
      download_url: attachment_id_of(attachment)
        .map(|id| format!("/jira/{}/attachments/{}", issue_key, id)),
    })
    .collect()
}

fn attachment_list(fields: &Value) -> &[Value] {
  fields
    .get("attachment")
    .and_then(Value::as_array)
    .map_or(EMPTY, Vec::as_slice)
}
