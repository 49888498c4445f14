//! Cost statistics endpoint.
//!
//! GET /api/v1/costs - Running total, request count, and recent records.

use std::time::Instant;

use axum::extract::State;
use axum::Json;

use colloquy_types::cost::CostStats;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/costs - Cost tracking statistics.
///
/// Returns 503 when cost tracking is disabled in configuration.
pub async fn get_cost_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CostStats>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let tracker = state
        .gateway
        .cost_tracker()
        .ok_or(AppError::CostTrackingDisabled)?;
    let stats = tracker.stats();

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(stats, request_id, elapsed)))
}
