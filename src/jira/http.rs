//! Authenticated GET with bounded retry and exponential backoff.
//!
//! Only server-side (5xx) statuses are retried. A per-attempt timeout is a
//! terminal `Timeout` failure and any other transport failure is a terminal
//! `Network` failure; neither is retried. There is no deadline spanning the
//! whole retry sequence, only the per-attempt connect/read timeouts on the
//! underlying client.

use std::time::Duration;

use color_eyre::eyre::eyre;
use tracing::{error, warn};

use crate::config::Settings;

use super::error::{JiraError, Result};

pub struct HttpExecutor {
  client: reqwest::Client,
  email: String,
  api_token: String,
  max_attempts: u32,
  backoff_base: Duration,
}

impl HttpExecutor {
  pub fn new(settings: &Settings) -> color_eyre::Result<Self> {
    let client = reqwest::Client::builder()
      .connect_timeout(Duration::from_secs_f64(settings.connect_timeout_seconds))
      .read_timeout(Duration::from_secs_f64(settings.read_timeout_seconds))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      client,
      email: settings.jira_email.clone(),
      api_token: settings.jira_api_token.clone(),
      max_attempts: settings.retry_max_attempts,
      backoff_base: Duration::from_secs_f64(settings.retry_backoff_seconds),
    })
  }

  /// Perform one logical GET against `url`, retrying transient 5xx responses.
  ///
  /// Returns the final response even when its status is >= 400; callers
  /// classify 4xx/5xx themselves. The body has not been consumed, so the
  /// caller may buffer it or stream it.
  pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
    for attempt in 1..=self.max_attempts {
      let mut request = self
        .client
        .get(url)
        .basic_auth(&self.email, Some(&self.api_token));
      if !query.is_empty() {
        request = request.query(query);
      }

      let response = match request.send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
          warn!(url, attempt, attempts = self.max_attempts, "Jira request timed out");
          return Err(JiraError::Timeout);
        }
        Err(e) => {
          error!(url, error = %e, "Network error while calling Jira API");
          return Err(JiraError::Network);
        }
      };

      if response.status().as_u16() < 500 || attempt == self.max_attempts {
        return Ok(response);
      }

      let backoff = self.backoff_delay(attempt);
      warn!(
        url,
        status_code = response.status().as_u16(),
        attempt,
        attempts = self.max_attempts,
        backoff_seconds = backoff.as_secs_f64(),
        "Transient Jira 5xx, retrying"
      );
      // Release the connection before sleeping.
      drop(response);
      tokio::time::sleep(backoff).await;
    }

    Err(JiraError::upstream("Unexpected Jira retry state"))
  }

  /// Backoff before the attempt after `attempt` fails: `base * 2^(attempt-1)`.
  fn backoff_delay(&self, attempt: u32) -> Duration {
    self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
  }
}
