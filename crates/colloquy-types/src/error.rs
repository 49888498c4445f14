//! Gateway-level error taxonomy.
//!
//! Provider adapters fail with [`crate::llm::LlmError`]. The retry
//! policy wraps those into [`RetryError`], distinguishing a permanent
//! error (surfaced on first occurrence) from an exhausted attempt
//! budget. The gateway folds per-provider outcomes into
//! [`GatewayError`], the only error type that crosses its boundary.

use thiserror::Error;

use crate::llm::{LlmError, ProviderKind};

/// Outcome of running one adapter through the retry policy.
#[derive(Debug, Error)]
pub enum RetryError {
    /// A non-retryable error occurred; no further attempts were made.
    #[error("permanent provider error: {0}")]
    Permanent(LlmError),

    /// Every attempt failed with a transient error.
    #[error("provider exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: LlmError },
}

impl RetryError {
    /// Number of attempts actually made.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Permanent(_) => 1,
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The underlying provider error.
    pub fn into_inner(self) -> LlmError {
        match self {
            RetryError::Permanent(err) => err,
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

/// One provider's terminal failure, as recorded by the gateway.
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub attempts: u32,
    pub error: LlmError,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {}",
            self.provider, self.attempts, self.error
        )
    }
}

/// Terminal errors from the completion gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed request; never retried, surfaced immediately.
    #[error("validation error: {0}")]
    Validation(String),

    /// The primary provider failed and either fallback was disabled or
    /// the fallback provider failed too.
    #[error("completion failed: {primary}{}", .fallback.as_ref().map(|f| format!("; fallback: {f}")).unwrap_or_default())]
    CompletionFailed {
        primary: ProviderFailure,
        fallback: Option<ProviderFailure>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_error_attempts() {
        let permanent = RetryError::Permanent(LlmError::AuthenticationFailed);
        assert_eq!(permanent.attempts(), 1);

        let exhausted = RetryError::Exhausted {
            attempts: 3,
            last: LlmError::Timeout("30s".into()),
        };
        assert_eq!(exhausted.attempts(), 3);
    }

    #[test]
    fn test_gateway_error_display_includes_both_providers() {
        let err = GatewayError::CompletionFailed {
            primary: ProviderFailure {
                provider: ProviderKind::OpenAi,
                attempts: 3,
                error: LlmError::Timeout("30s".into()),
            },
            fallback: Some(ProviderFailure {
                provider: ProviderKind::Anthropic,
                attempts: 1,
                error: LlmError::AuthenticationFailed,
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("openai"), "missing primary: {msg}");
        assert!(msg.contains("anthropic"), "missing fallback: {msg}");
        assert!(msg.contains("3 attempt"), "missing attempt count: {msg}");
    }

    #[test]
    fn test_gateway_error_display_without_fallback() {
        let err = GatewayError::CompletionFailed {
            primary: ProviderFailure {
                provider: ProviderKind::Anthropic,
                attempts: 1,
                error: LlmError::InvalidRequest("empty messages".into()),
            },
            fallback: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("anthropic"));
        assert!(!msg.contains("fallback:"));
    }
}
