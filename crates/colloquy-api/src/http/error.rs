//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Internal provider error detail is logged where the failure happens;
//! clients get a generic message with a machine-readable code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use colloquy_types::error::GatewayError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request.
    Validation(String),
    /// Both providers (or the only permitted provider) failed.
    CompletionFailed,
    /// Requested context does not exist (or the store is unreachable --
    /// the two are indistinguishable by design).
    ContextNotFound,
    /// Cost tracking is switched off in configuration.
    CostTrackingDisabled,
    /// Generic internal error.
    Internal(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(msg) => AppError::Validation(msg),
            GatewayError::CompletionFailed { .. } => {
                // Detail already logged by the gateway; keep the client
                // response generic.
                AppError::CompletionFailed
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::CompletionFailed => (
                StatusCode::BAD_GATEWAY,
                "COMPLETION_FAILED",
                "Failed to generate completion".to_string(),
            ),
            AppError::ContextNotFound => (
                StatusCode::NOT_FOUND,
                "CONTEXT_NOT_FOUND",
                "Context not found".to_string(),
            ),
            AppError::CostTrackingDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "COST_TRACKING_DISABLED",
                "Cost tracking is not enabled".to_string(),
            ),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_types::error::ProviderFailure;
    use colloquy_types::llm::{LlmError, ProviderKind};

    #[test]
    fn test_validation_maps_to_400() {
        let response = AppError::Validation("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_completion_failed_maps_to_502_without_detail() {
        let gateway_err = GatewayError::CompletionFailed {
            primary: ProviderFailure {
                provider: ProviderKind::OpenAi,
                attempts: 3,
                error: LlmError::Timeout("internal detail".into()),
            },
            fallback: None,
        };
        let app_err: AppError = gateway_err.into();
        let response = app_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_cost_tracking_disabled_maps_to_503() {
        let response = AppError::CostTrackingDisabled.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_context_not_found_maps_to_404() {
        let response = AppError::ContextNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
