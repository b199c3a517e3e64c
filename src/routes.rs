//! HTTP surface: router, path validation, error-to-status mapping, and the
//! streaming attachment response.

use std::sync::Arc;
use std::sync::LazyLock;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::jira::{Issue, JiraError, JiraService};

static ISSUE_KEY_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]+-\d+$").expect("valid issue key pattern"));
static ATTACHMENT_ID_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\d+$").expect("valid attachment id pattern"));

const ROOT_PAGE_HTML: &str = include_str!("../assets/index.html");

pub fn router(service: Arc<JiraService>) -> Router {
  Router::new()
    .route("/", get(root))
    .route("/health", get(health))
    .route("/jira/{issue_key}", get(get_issue))
    .route("/jira/{issue_key}/attachments/{attachment_id}", get(get_attachment))
    .route("/tools/jira.get_issue", post(tool_get_issue))
    .layer(TraceLayer::new_for_http())
    .with_state(service)
}

/// Error body in the same `{"detail": ...}` shape for every failure.
struct ApiError {
  status: StatusCode,
  detail: String,
}

impl ApiError {
  fn unprocessable(detail: &str) -> Self {
    Self {
      status: StatusCode::UNPROCESSABLE_ENTITY,
      detail: detail.to_string(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(json!({"detail": self.detail}))).into_response()
  }
}

impl From<JiraError> for ApiError {
  fn from(e: JiraError) -> Self {
    let status = match &e {
      JiraError::NotFound(_) => StatusCode::NOT_FOUND,
      JiraError::Unauthorized { status, .. } => {
        StatusCode::from_u16(*status).unwrap_or(StatusCode::UNAUTHORIZED)
      }
      JiraError::Timeout => StatusCode::GATEWAY_TIMEOUT,
      JiraError::Network => StatusCode::SERVICE_UNAVAILABLE,
      JiraError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };

    match &e {
      JiraError::Network | JiraError::Upstream(_) => error!(error = %e, "Jira service error"),
      _ => warn!(error = %e, "Jira request failed"),
    }

    Self {
      status,
      detail: e.to_string(),
    }
  }
}

async fn root() -> Html<&'static str> {
  Html(ROOT_PAGE_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
  status: &'static str,
}

async fn health() -> Json<HealthResponse> {
  Json(HealthResponse { status: "ok" })
}

async fn get_issue(
  State(service): State<Arc<JiraService>>,
  Path(issue_key): Path<String>,
) -> Result<Json<Issue>, ApiError> {
  if !ISSUE_KEY_PATTERN.is_match(&issue_key) {
    return Err(ApiError::unprocessable("Invalid issue key format"));
  }

  let issue = service.get_issue(&issue_key).await?;
  Ok(Json(issue))
}

async fn get_attachment(
  State(service): State<Arc<JiraService>>,
  Path((issue_key, attachment_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
  if !ISSUE_KEY_PATTERN.is_match(&issue_key) {
    return Err(ApiError::unprocessable("Invalid issue key format"));
  }
  if !ATTACHMENT_ID_PATTERN.is_match(&attachment_id) {
    return Err(ApiError::unprocessable("Invalid attachment id format"));
  }

  let stream = service.get_attachment(&issue_key, &attachment_id).await?;

  let mut response = Response::builder()
    .header(
      header::CONTENT_TYPE,
      HeaderValue::from_str(&stream.media_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    )
    .header(
      header::CONTENT_DISPOSITION,
      HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        stream.filename.replace('"', "'")
      ))
      .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
  if let Some(size) = stream.size {
    response = response.header(header::CONTENT_LENGTH, size);
  }

  response
    .body(Body::from_stream(stream.chunks))
    .map_err(|e| ApiError {
      status: StatusCode::INTERNAL_SERVER_ERROR,
      detail: e.to_string(),
    })
}

#[derive(Deserialize)]
struct ToolRequest {
  issue_key: String,
}

#[derive(Serialize)]
struct ToolError {
  code: &'static str,
  message: String,
}

#[derive(Serialize)]
struct ToolResponse {
  ok: bool,
  data: Option<Issue>,
  error: Option<ToolError>,
}

/// Tool-call envelope: failures come back as a structured `error` payload
/// with a 200 status instead of an HTTP error.
async fn tool_get_issue(
  State(service): State<Arc<JiraService>>,
  Json(request): Json<ToolRequest>,
) -> Result<Json<ToolResponse>, ApiError> {
  if !ISSUE_KEY_PATTERN.is_match(&request.issue_key) {
    return Err(ApiError::unprocessable("Invalid issue key format"));
  }

  let response = match service.get_issue(&request.issue_key).await {
    Ok(issue) => ToolResponse {
      ok: true,
      data: Some(issue),
      error: None,
    },
    Err(e) => {
      let (code, message) = match &e {
        JiraError::NotFound(_) => ("NOT_FOUND", "Invalid issue key".to_string()),
        JiraError::Unauthorized { .. } => ("UNAUTHORIZED", e.to_string()),
        JiraError::Timeout => ("TIMEOUT", e.to_string()),
        JiraError::Network => ("NETWORK_ERROR", e.to_string()),
        JiraError::Upstream(_) => ("JIRA_ERROR", e.to_string()),
      };
      ToolResponse {
        ok: false,
        data: None,
        error: Some(ToolError { code, message }),
      }
    }
  };

  Ok(Json(response))
}
