//! Flat response types derived from raw Jira issue documents.

use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;

use super::error::JiraError;

/// Full issue details, flattened for the viewer and the tool endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
  pub issue_key: String,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub status: Option<String>,
  pub issue_type: Option<String>,
  pub priority: Option<String>,
  pub assignee: Option<String>,
  pub reporter: Option<String>,
  pub created: Option<String>,
  pub updated: Option<String>,
  pub comments: Vec<Comment>,
  pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
  pub author: Option<String>,
  pub body: Option<String>,
  pub created: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
  pub filename: Option<String>,
  pub size: Option<u64>,
  #[serde(rename = "mimeType")]
  pub mime_type: Option<String>,
  /// Same-origin proxy path; present only when the upstream attachment
  /// carries an identifier.
  pub download_url: Option<String>,
}

/// A finite, non-restartable sequence of attachment byte chunks backed by a
/// live upstream connection. The connection is owned by `chunks` and is
/// released when the stream is drained, dropped early, or errors mid-read.
pub struct AttachmentStream {
  pub chunks: BoxStream<'static, Result<Bytes, JiraError>>,
  pub media_type: String,
  pub filename: String,
  pub size: Option<u64>,
}

impl std::fmt::Debug for AttachmentStream {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AttachmentStream")
      .field("media_type", &self.media_type)
      .field("filename", &self.filename)
      .field("size", &self.size)
      .finish_non_exhaustive()
  }
}
