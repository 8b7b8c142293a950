//! Request and response types for the chat API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::routing::RouteTag;

/// Body of `POST /chat`; `GET /chat` carries the same fields as query
/// parameters (minus `contexts`).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "query must be 1 to 4000 characters"))]
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Route name or "auto" (default) for automatic routing
    #[serde(default)]
    pub agent: Option<String>,
    /// Optional explicit contexts; skips retrieval in the specialist
    #[serde(default)]
    pub contexts: Option<Vec<String>>,
}

impl ChatRequest {
    /// The route hint, if the caller pinned one. "auto" and absence both
    /// mean automatic routing; anything else must be a known route.
    pub fn route_hint(&self) -> Result<Option<RouteTag>, ApiError> {
        match self.agent.as_deref() {
            None | Some("auto") | Some("") => Ok(None),
            Some(name) => RouteTag::parse(name).map(Some).ok_or_else(|| {
                ApiError::bad_request(format!(
                    "unknown agent '{name}'; use auto, assistant, technical, organizational or faq"
                ))
            }),
        }
    }
}

/// Query parameters of `GET /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatParams {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
}

impl From<ChatParams> for ChatRequest {
    fn from(params: ChatParams) -> Self {
        Self {
            query: params.query,
            session_id: params.session_id,
            agent: params.agent,
            contexts: None,
        }
    }
}

/// Chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub ok: bool,
    pub agent: RouteTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub contexts: Vec<String>,
    pub answer: String,
}

/// API error with an HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            ok: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
