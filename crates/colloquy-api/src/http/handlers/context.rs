//! Context lifecycle endpoints.
//!
//! Load/save/delete/list/clear operations keyed by
//! `(agent_id, context_id)` string pairs. The store is best-effort: a
//! missing context and an unreachable store are indistinguishable, both
//! surface as 404 on load.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use colloquy_core::context::store::ContextKey;
use colloquy_types::context::ConversationContext;
use colloquy_types::llm::Message;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for list and clear.
#[derive(Debug, Deserialize)]
pub struct AgentFilter {
    pub agent_id: Option<String>,
}

/// Request body for PUT /api/v1/contexts/{agent_id}/{context_id}.
#[derive(Debug, Deserialize)]
pub struct SaveContextBody {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Expiration override in seconds; the configured default otherwise.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

fn default_max_history() -> usize {
    10
}

/// Request body for POST /api/v1/contexts/{agent_id}/{context_id}/ttl.
#[derive(Debug, Default, Deserialize)]
pub struct ExtendTtlBody {
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

/// GET /api/v1/contexts/{agent_id}/{context_id} - Load a context.
pub async fn get_context(
    State(state): State<AppState>,
    Path((agent_id, context_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ConversationContext>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let context = state
        .contexts
        .load(&agent_id, &context_id)
        .await
        .ok_or(AppError::ContextNotFound)?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(context, request_id, elapsed)))
}

/// PUT /api/v1/contexts/{agent_id}/{context_id} - Save a context.
///
/// Overwrites any prior value; last writer wins.
pub async fn save_context(
    State(state): State<AppState>,
    Path((agent_id, context_id)): Path<(String, String)>,
    Json(body): Json<SaveContextBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let context = ConversationContext::from_parts(body.messages, body.metadata, body.max_history);
    let ttl = body
        .ttl_secs
        .map(Duration::from_secs)
        .unwrap_or(state.context_ttl);

    let saved = state
        .contexts
        .save(&agent_id, &context_id, &context, Some(ttl))
        .await;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({ "saved": saved });
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

/// DELETE /api/v1/contexts/{agent_id}/{context_id} - Delete a context.
pub async fn delete_context(
    State(state): State<AppState>,
    Path((agent_id, context_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let deleted = state.contexts.delete(&agent_id, &context_id).await;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({ "deleted": deleted });
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

/// POST /api/v1/contexts/{agent_id}/{context_id}/ttl - Refresh expiry.
pub async fn extend_context_ttl(
    State(state): State<AppState>,
    Path((agent_id, context_id)): Path<(String, String)>,
    Json(body): Json<ExtendTtlBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let ttl = body
        .ttl_secs
        .map(Duration::from_secs)
        .unwrap_or(state.context_ttl);

    let extended = state
        .contexts
        .extend_ttl(&agent_id, &context_id, Some(ttl))
        .await;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({ "extended": extended });
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

/// GET /api/v1/contexts?agent_id= - Enumerate stored contexts.
pub async fn list_contexts(
    State(state): State<AppState>,
    Query(filter): Query<AgentFilter>,
) -> Result<Json<ApiResponse<Vec<ContextKey>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let keys = state.contexts.list(filter.agent_id.as_deref()).await;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(keys, request_id, elapsed)))
}

/// DELETE /api/v1/contexts?agent_id= - Bulk delete contexts.
pub async fn clear_contexts(
    State(state): State<AppState>,
    Query(filter): Query<AgentFilter>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let deleted = state.contexts.clear_all(filter.agent_id.as_deref()).await;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({ "deleted": deleted });
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}
