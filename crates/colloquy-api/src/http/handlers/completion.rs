//! Completion endpoint.
//!
//! POST /api/v1/completions - Generate a completion through the
//! gateway, with automatic retry and cross-provider fallback.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::Instrument;

use colloquy_observe::genai_attrs::{
    GEN_AI_OPERATION_NAME, GEN_AI_PROVIDER_NAME, GEN_AI_REQUEST_MODEL, OP_CHAT,
};
use colloquy_types::llm::{CompletionOptions, CompletionResult, Message, ProviderKind};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

fn default_fallback() -> bool {
    true
}

/// Request body for POST /api/v1/completions.
#[derive(Debug, Deserialize)]
pub struct CompletionRequestBody {
    pub messages: Vec<Message>,
    /// Primary provider; defaults to OpenAI.
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_fallback")]
    pub fallback: bool,
}

/// POST /api/v1/completions - Generate a completion.
pub async fn create_completion(
    State(state): State<AppState>,
    Json(body): Json<CompletionRequestBody>,
) -> Result<Json<ApiResponse<CompletionResult>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let options = CompletionOptions {
        provider: body.provider.unwrap_or(ProviderKind::OpenAi),
        model: body.model,
        temperature: body.temperature,
        max_tokens: body.max_tokens,
        fallback: body.fallback,
    };

    let provider_name = options.provider.to_string();
    let span = tracing::info_span!(
        "chat",
        { GEN_AI_OPERATION_NAME } = OP_CHAT,
        { GEN_AI_PROVIDER_NAME } = provider_name.as_str(),
        { GEN_AI_REQUEST_MODEL } = options.model.as_deref().unwrap_or("default"),
        request_id = request_id.as_str(),
    );

    let result = state
        .gateway
        .complete(&body.messages, &options)
        .instrument(span)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(result, request_id, elapsed)))
}
