//! Failure kinds for the Jira integration.
//!
//! Each kind is raised at the point of detection and propagated unmodified;
//! the route layer owns the mapping to HTTP status codes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, JiraError>;

#[derive(Debug, Error)]
pub enum JiraError {
  /// Bad issue key, missing attachment, or missing download URL.
  #[error("{0}")]
  NotFound(String),

  /// Upstream rejected the credentials (401) or the permission (403).
  #[error("{message}")]
  Unauthorized { message: String, status: u16 },

  /// A single attempt exceeded the configured connect/read timeout.
  #[error("Jira request timed out")]
  Timeout,

  /// Transport-level failure below HTTP (DNS, refused connection, TLS).
  #[error("Unable to connect to Jira API")]
  Network,

  /// Any other upstream status >= 400, or an unparseable success body.
  #[error("{0}")]
  Upstream(String),
}

impl JiraError {
  pub fn not_found(message: impl Into<String>) -> Self {
    JiraError::NotFound(message.into())
  }

  pub fn upstream(message: impl Into<String>) -> Self {
    JiraError::Upstream(message.into())
  }
}
