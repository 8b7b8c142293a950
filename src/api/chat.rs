//! Chat endpoint handlers

use axum::extract::{Query, State};
use axum::Json;
use tracing::info;
use validator::Validate;

use super::state::AppState;
use super::types::{ApiError, ChatParams, ChatRequest, ChatResponse};
use crate::domain::context::ContextSource;
use crate::infrastructure::pipeline::PipelineRequest;

/// GET /chat - query-string variant for quick checks from a browser
pub async fn chat_get(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> Result<Json<ChatResponse>, ApiError> {
    run_chat(state, params.into()).await
}

/// POST /chat - main entry point
pub async fn chat_post(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    run_chat(state, request).await
}

async fn run_chat(state: AppState, request: ChatRequest) -> Result<Json<ChatResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let route_hint = request.route_hint()?;

    info!(session_id = ?request.session_id, "chat request");

    let mut pipeline_request = PipelineRequest::new(request.query.clone());
    if let Some(session_id) = &request.session_id {
        pipeline_request = pipeline_request.with_session(session_id.clone());
    }
    if let Some(route) = route_hint {
        pipeline_request = pipeline_request.with_route_hint(route);
    }
    if let Some(contexts) = &request.contexts {
        pipeline_request = pipeline_request.with_contexts(
            contexts.iter().map(|c| ContextSource::from(c.as_str())).collect(),
        );
    }

    let outcome = state.pipeline.run(pipeline_request).await;

    Ok(Json(ChatResponse {
        ok: true,
        agent: outcome.route,
        session_id: request.session_id,
        contexts: outcome.contexts,
        answer: outcome.answer,
    }))
}
