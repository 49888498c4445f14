//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. Middleware: CORS, request tracing.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Completions
        .route("/completions", post(handlers::completion::create_completion))
        // Cost tracking
        .route("/costs", get(handlers::cost::get_cost_stats))
        // Context lifecycle
        .route("/contexts", get(handlers::context::list_contexts))
        .route("/contexts", delete(handlers::context::clear_contexts))
        .route(
            "/contexts/{agent_id}/{context_id}",
            get(handlers::context::get_context),
        )
        .route(
            "/contexts/{agent_id}/{context_id}",
            put(handlers::context::save_context),
        )
        .route(
            "/contexts/{agent_id}/{context_id}",
            delete(handlers::context::delete_context),
        )
        .route(
            "/contexts/{agent_id}/{context_id}/ttl",
            post(handlers::context::extend_context_ttl),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness probe.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
