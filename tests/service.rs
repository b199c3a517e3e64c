//! Integration tests for the Jira service against a local mock upstream.
//!
//! Each test spins up a throwaway axum server on 127.0.0.1:0 that plays the
//! Jira API, counting requests so retry and cache behavior can be asserted
//! exactly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use jiraview::config::Settings;
use jiraview::jira::{JiraError, JiraService};

async fn spawn_upstream(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{}", addr)
}

fn test_settings(base_url: &str) -> Settings {
  Settings {
    jira_base_url: base_url.to_string(),
    jira_email: "user@example.com".to_string(),
    jira_api_token: "secret".to_string(),
    retry_backoff_seconds: 0.0,
    ..Settings::default()
  }
}

fn issue_doc() -> Value {
  json!({
    "key": "ABC-1",
    "fields": {
      "summary": "A bug",
      "description": {"content": [{"content": [{"text": "plain"}, {"text": "text"}]}]},
      "status": {"name": "Open"},
      "issuetype": {"name": "Bug"},
      "comment": {"comments": []}
    },
    "renderedFields": {}
  })
}

/// Upstream that serves the same issue document on every request and counts
/// how many requests arrived, after an optional run of leading statuses.
fn scripted_upstream(hits: Arc<AtomicUsize>, leading_statuses: Vec<u16>) -> Router {
  Router::new().route(
    "/rest/api/3/issue/{key}",
    get(move |Query(query): Query<Vec<(String, String)>>| {
      let hits = Arc::clone(&hits);
      let leading_statuses = leading_statuses.clone();
      async move {
        assert!(
          query.contains(&("expand".to_string(), "renderedFields,changelog".to_string())),
          "expand parameter missing: {:?}",
          query
        );
        let attempt = hits.fetch_add(1, Ordering::SeqCst);
        match leading_statuses.get(attempt) {
          Some(status) => StatusCode::from_u16(*status).unwrap().into_response(),
          None => Json(issue_doc()).into_response(),
        }
      }
    }),
  )
}

#[tokio::test]
async fn test_fetch_issue_normalizes_document() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![])).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  let issue = service.get_issue("ABC-1").await.unwrap();
  assert_eq!(issue.issue_key, "ABC-1");
  assert_eq!(issue.summary.as_deref(), Some("A bug"));
  assert_eq!(issue.description.as_deref(), Some("plain text"));
  assert_eq!(issue.status.as_deref(), Some("Open"));
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retries_5xx_until_success() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![502, 502])).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  let issue = service.get_issue("ABC-1").await.unwrap();
  assert_eq!(issue.issue_key, "ABC-1");
  assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_stops_after_max_attempts_of_5xx() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![502, 502, 502, 502])).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  let err = service.get_issue("ABC-1").await.unwrap_err();
  assert!(matches!(err, JiraError::Upstream(_)));
  // Exactly max_attempts calls, no fourth attempt.
  assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_404_is_not_found_without_retry() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![404])).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  let err = service.get_issue("ABC-1").await.unwrap_err();
  assert!(matches!(err, JiraError::NotFound(_)));
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unauthorized_carries_upstream_status() {
  let base = spawn_upstream(scripted_upstream(Arc::new(AtomicUsize::new(0)), vec![403])).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  match service.get_issue("ABC-1").await.unwrap_err() {
    JiraError::Unauthorized { status, .. } => assert_eq!(status, 403),
    other => panic!("expected Unauthorized, got {:?}", other),
  }
}

#[tokio::test]
async fn test_invalid_success_body_is_upstream_error() {
  let router = Router::new().route("/rest/api/3/issue/{key}", get(|| async { "not json" }));
  let base = spawn_upstream(router).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  let err = service.get_issue("ABC-1").await.unwrap_err();
  assert!(matches!(err, JiraError::Upstream(_)));
}

#[tokio::test]
async fn test_cache_hit_suppresses_network() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![])).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  service.get_issue("ABC-1").await.unwrap();
  // Differs only by case and whitespace: same normalized cache entry.
  service.get_issue("  abc-1 ").await.unwrap();
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![])).await;
  let settings = Settings {
    enable_response_cache: false,
    ..test_settings(&base)
  };
  let service = JiraService::new(&settings).unwrap();

  service.get_issue("ABC-1").await.unwrap();
  service.get_issue("ABC-1").await.unwrap();
  assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_entry_expires_after_ttl() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![])).await;
  let settings = Settings {
    cache_ttl_seconds: 1,
    ..test_settings(&base)
  };
  let service = JiraService::new(&settings).unwrap();

  service.get_issue("ABC-1").await.unwrap();
  tokio::time::sleep(Duration::from_millis(1100)).await;
  service.get_issue("ABC-1").await.unwrap();
  assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_blank_key_is_not_found_with_zero_requests() {
  let hits = Arc::new(AtomicUsize::new(0));
  let base = spawn_upstream(scripted_upstream(Arc::clone(&hits), vec![])).await;
  let service = JiraService::new(&test_settings(&base)).unwrap();

  let err = service.get_issue("   ").await.unwrap_err();
  assert!(matches!(err, JiraError::NotFound(_)));
  assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_per_attempt_timeout_is_timeout_error() {
  let router = Router::new().route(
    "/rest/api/3/issue/{key}",
    get(|| async {
      tokio::time::sleep(Duration::from_secs(5)).await;
      "too late"
    }),
  );
  let base = spawn_upstream(router).await;
  let settings = Settings {
    read_timeout_seconds: 0.2,
    ..test_settings(&base)
  };
  let service = JiraService::new(&settings).unwrap();

  let err = service.get_issue("ABC-1").await.unwrap_err();
  assert!(matches!(err, JiraError::Timeout));
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
  // Bind to get a free port, then drop the listener so connections refuse.
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let base = format!("http://{}", listener.local_addr().unwrap());
  drop(listener);

  let service = JiraService::new(&test_settings(&base)).unwrap();
  let err = service.get_issue("ABC-1").await.unwrap_err();
  assert!(matches!(err, JiraError::Network));
}
