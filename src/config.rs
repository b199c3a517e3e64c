//! Environment-based application settings.
//!
//! Everything is read once at startup and validated before the service is
//! constructed; request handlers only ever see an already-valid `Settings`.

use color_eyre::eyre::{bail, eyre, Result};

#[derive(Debug, Clone)]
pub struct Settings {
  pub jira_base_url: String,
  pub jira_email: String,
  pub jira_api_token: String,
  pub connect_timeout_seconds: f64,
  pub read_timeout_seconds: f64,
  pub retry_max_attempts: u32,
  pub retry_backoff_seconds: f64,
  pub enable_response_cache: bool,
  pub cache_ttl_seconds: u64,
  pub log_level: String,
}

impl Default for Settings {
  /// Field defaults. The three required values are empty and rejected by
  /// `validate`.
  fn default() -> Self {
    Self {
      jira_base_url: String::new(),
      jira_email: String::new(),
      jira_api_token: String::new(),
      connect_timeout_seconds: 5.0,
      read_timeout_seconds: 20.0,
      retry_max_attempts: 3,
      retry_backoff_seconds: 0.5,
      enable_response_cache: true,
      cache_ttl_seconds: 180,
      log_level: "info".to_string(),
    }
  }
}

impl Settings {
  /// Load settings from environment variables (with `.env` support).
  ///
  /// Required: `JIRA_BASE_URL`, `JIRA_EMAIL`, `JIRA_API_TOKEN`.
  /// Optional with defaults: `REQUEST_CONNECT_TIMEOUT_SECONDS`,
  /// `REQUEST_READ_TIMEOUT_SECONDS`, `RETRY_MAX_ATTEMPTS`,
  /// `RETRY_BACKOFF_SECONDS`, `ENABLE_RESPONSE_CACHE`, `CACHE_TTL_SECONDS`,
  /// `LOG_LEVEL`.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();

    let defaults = Settings::default();
    let settings = Settings {
      jira_base_url: env_string("JIRA_BASE_URL").trim_end_matches('/').to_string(),
      jira_email: env_string("JIRA_EMAIL"),
      jira_api_token: env_string("JIRA_API_TOKEN"),
      connect_timeout_seconds: env_parse(
        "REQUEST_CONNECT_TIMEOUT_SECONDS",
        defaults.connect_timeout_seconds,
      )?,
      read_timeout_seconds: env_parse(
        "REQUEST_READ_TIMEOUT_SECONDS",
        defaults.read_timeout_seconds,
      )?,
      retry_max_attempts: env_parse("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts)?,
      retry_backoff_seconds: env_parse("RETRY_BACKOFF_SECONDS", defaults.retry_backoff_seconds)?,
      enable_response_cache: env_bool("ENABLE_RESPONSE_CACHE", defaults.enable_response_cache),
      cache_ttl_seconds: env_parse("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds)?,
      log_level: match env_string("LOG_LEVEL") {
        s if s.is_empty() => defaults.log_level,
        s => s.to_lowercase(),
      },
    };

    settings.validate()?;
    Ok(settings)
  }

  pub fn validate(&self) -> Result<()> {
    let missing: Vec<&str> = [
      ("JIRA_BASE_URL", &self.jira_base_url),
      ("JIRA_EMAIL", &self.jira_email),
      ("JIRA_API_TOKEN", &self.jira_api_token),
    ]
    .iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| *name)
    .collect();

    if !missing.is_empty() {
      bail!("Missing required environment variables: {}", missing.join(", "));
    }

    if self.connect_timeout_seconds <= 0.0 {
      bail!("REQUEST_CONNECT_TIMEOUT_SECONDS must be > 0");
    }
    if self.read_timeout_seconds <= 0.0 {
      bail!("REQUEST_READ_TIMEOUT_SECONDS must be > 0");
    }
    if !(1..=8).contains(&self.retry_max_attempts) {
      bail!("RETRY_MAX_ATTEMPTS must be between 1 and 8");
    }
    if self.retry_backoff_seconds < 0.0 {
      bail!("RETRY_BACKOFF_SECONDS must be >= 0");
    }
    if !(120..=300).contains(&self.cache_ttl_seconds) {
      bail!("CACHE_TTL_SECONDS must be between 120 and 300");
    }

    Ok(())
  }
}

fn env_string(name: &str) -> String {
  std::env::var(name).unwrap_or_default()
}

fn env_bool(name: &str, default: bool) -> bool {
  match std::env::var(name) {
    Ok(value) => value.trim().eq_ignore_ascii_case("true"),
    Err(_) => default,
  }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  match std::env::var(name) {
    Ok(value) => value
      .trim()
      .parse()
      .map_err(|e| eyre!("Invalid value for {}: {}", name, e)),
    Err(_) => Ok(default),
  }
}
