//! LLM request/response types for Colloquy.
//!
//! These types model the data shapes for provider interactions:
//! completion requests, normalized responses, token usage, and the
//! provider error taxonomy with its transient/permanent split.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a conversation. Ordering is chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// One of the two supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    /// The alternate provider used for fallback.
    pub fn other(self) -> Self {
        match self {
            ProviderKind::OpenAi => ProviderKind::Anthropic,
            ProviderKind::Anthropic => ProviderKind::OpenAi,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(format!("invalid provider: '{other}'")),
        }
    }
}

/// Token usage for a single completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Normalized request handed to a provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// System instruction override. When absent, adapters that need a
    /// dedicated system field extract it from the message list instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub max_tokens: u32,
}

/// Normalized reply from a provider adapter, irrespective of
/// backend-specific field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
    /// Set by backends that report a `finish_reason` (OpenAI-style).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Set by backends that report a `stop_reason` (Anthropic-style).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Caller-facing options for a gateway completion.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Primary provider to try first.
    pub provider: ProviderKind,
    /// Model override; the provider's configured default otherwise.
    pub model: Option<String>,
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: Option<f64>,
    /// Maximum output tokens, must be greater than zero when set.
    pub max_tokens: Option<u32>,
    /// Try the alternate provider once after the primary is exhausted.
    pub fallback: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: None,
            temperature: None,
            max_tokens: None,
            fallback: true,
        }
    }
}

/// Completion metadata returned alongside the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    pub duration_ms: u64,
}

/// Result of a successful gateway completion. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub content: String,
    pub model: String,
    pub provider: ProviderKind,
    pub usage: Usage,
    pub metadata: CompletionMetadata,
}

/// Errors from provider adapter operations.
///
/// [`LlmError::is_transient`] classifies each variant as retry-eligible
/// (timeouts, rate limits, overload, 5xx, connection failures) or
/// permanent (auth, bad request, undecodable reply).
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("provider API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl LlmError {
    /// Whether this error is retry-eligible.
    ///
    /// Timeouts, connection failures, 429 and 5xx responses are
    /// transient. Auth failures, malformed requests, other 4xx statuses
    /// and undecodable replies are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Timeout(_)
            | LlmError::Http(_)
            | LlmError::RateLimited { .. }
            | LlmError::Overloaded(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::AuthenticationFailed
            | LlmError::InvalidRequest(_)
            | LlmError::Deserialization(_) => false,
        }
    }
}
