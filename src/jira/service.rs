//! Jira upstream client: cache-or-fetch issue lookup and attachment
//! proxying, built on the retrying HTTP executor.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::eyre;
use futures::{StreamExt, TryStreamExt};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::{error, info};

use crate::config::Settings;

use super::cache::IssueCache;
use super::error::{JiraError, Result};
use super::http::HttpExecutor;
use super::normalize;
use super::stream::{chunk_stream, stream_error, CHUNK_SIZE};
use super::types::{AttachmentStream, Issue};

/// Everything except RFC 3986 unreserved characters gets percent-encoded
/// when the issue key is placed in the request path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'~');

/// Upstream Jira client with response caching.
///
/// Constructed once at startup from validated settings and shared by
/// reference with the request handlers.
pub struct JiraService {
  http: HttpExecutor,
  cache: IssueCache,
  base_url: String,
}

impl JiraService {
  pub fn new(settings: &Settings) -> color_eyre::Result<Self> {
    url::Url::parse(&settings.jira_base_url)
      .map_err(|e| eyre!("Invalid JIRA_BASE_URL {:?}: {}", settings.jira_base_url, e))?;

    Ok(Self {
      http: HttpExecutor::new(settings)?,
      cache: IssueCache::new(
        settings.enable_response_cache,
        Duration::from_secs(settings.cache_ttl_seconds),
      ),
      base_url: settings.jira_base_url.trim_end_matches('/').to_string(),
    })
  }

  /// Fetch an issue by key and flatten it into the public response shape.
  pub async fn get_issue(&self, issue_key: &str) -> Result<Issue> {
    let document = self.issue_document(issue_key).await?;
    Ok(normalize::issue_from_document(&document))
  }

  /// Open a streamed download for one of an issue's attachments.
  ///
  /// The issue lookup reuses the cache-or-fetch path; the attachment bytes
  /// themselves are never cached.
  pub async fn get_attachment(
    &self,
    issue_key: &str,
    attachment_id: &str,
  ) -> Result<AttachmentStream> {
    let document = self.issue_document(issue_key).await?;

    let attachment = normalize::find_attachment(&document, attachment_id)
      .ok_or_else(|| JiraError::not_found("Attachment not found for this issue"))?;
    let content_url = attachment
      .get("content")
      .and_then(Value::as_str)
      .ok_or_else(|| JiraError::not_found("Attachment download URL is unavailable"))?;

    let response = self.http.get(content_url, &[]).await?;
    let status = response.status().as_u16();
    match status {
      404 => return Err(JiraError::not_found("Attachment not found")),
      401 | 403 => {
        return Err(JiraError::Unauthorized {
          message: "Unauthorized or permission denied for attachment".to_string(),
          status,
        })
      }
      s if s >= 400 => return Err(JiraError::upstream("Failed to fetch attachment from Jira")),
      _ => {}
    }

    let filename = attachment
      .get("filename")
      .and_then(Value::as_str)
      .map(str::to_string)
      .unwrap_or_else(|| format!("attachment-{}", attachment_id));
    let media_type = attachment
      .get("mimeType")
      .and_then(Value::as_str)
      .unwrap_or("application/octet-stream")
      .to_string();
    let size = attachment.get("size").and_then(Value::as_u64);

    let source = response.bytes_stream().map_err(stream_error);
    Ok(AttachmentStream {
      chunks: chunk_stream(source, CHUNK_SIZE).boxed(),
      media_type,
      filename,
      size,
    })
  }

  /// Normalize the key, consult the cache, fall back to the network, and
  /// cache the raw document on success.
  async fn issue_document(&self, issue_key: &str) -> Result<Arc<Value>> {
    let key = issue_key.trim().to_uppercase();
    if key.is_empty() {
      return Err(JiraError::not_found("Invalid issue key"));
    }

    if let Some(document) = self.cache.get(&key) {
      info!(issue_key = %key, "Issue cache hit");
      return Ok(document);
    }

    let document = Arc::new(self.fetch_issue_document(&key).await?);
    self.cache.put(&key, Arc::clone(&document));
    Ok(document)
  }

  async fn fetch_issue_document(&self, key: &str) -> Result<Value> {
    let url = format!(
      "{}/rest/api/3/issue/{}",
      self.base_url,
      utf8_percent_encode(key, PATH_SEGMENT)
    );

    info!(issue_key = %key, url = %url, "Fetching Jira issue");

    let response = self
      .http
      .get(&url, &[("expand", "renderedFields,changelog")])
      .await?;

    let status = response.status().as_u16();
    match status {
      404 => return Err(JiraError::not_found("Invalid issue key")),
      401 | 403 => {
        return Err(JiraError::Unauthorized {
          message: "Unauthorized or permission denied for Jira issue".to_string(),
          status,
        })
      }
      s if s >= 400 => {
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.chars().take(300).collect();
        error!(status_code = status, body = %preview, "Unexpected Jira API response");
        return Err(JiraError::upstream("Failed to fetch issue from Jira"));
      }
      _ => {}
    }

    response.json::<Value>().await.map_err(|e| {
      error!(error = %e, "Jira API returned non-JSON response");
      JiraError::upstream("Jira API returned invalid response")
    })
  }
}
