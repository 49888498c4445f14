//! AnthropicProvider -- concrete [`LlmProvider`] implementation for the
//! Anthropic Messages API (`/v1/messages`).
//!
//! The backend disallows system-role entries interleaved with the
//! conversation, so the adapter lifts the system instruction into the
//! dedicated `system` request field: an explicit override wins,
//! otherwise the first system-role message's content is used, and all
//! system-role entries are excluded from the messages array.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use colloquy_core::llm::provider::LlmProvider;
use colloquy_types::llm::{
    LlmError, MessageRole, ProviderKind, ProviderRequest, ProviderResponse, Usage,
};

use super::types::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse};

/// Anthropic Claude LLM provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

// AnthropicProvider intentionally does NOT derive Debug so the API key
// can never leak through debug formatting.

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    /// Create a new Anthropic provider with a per-attempt request timeout.
    pub fn new(api_key: SecretString, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }

    /// Override the base URL (useful for tests and proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`ProviderRequest`] into an [`AnthropicRequest`],
    /// extracting the system instruction and dropping system-role
    /// entries from the message list.
    fn build_request(&self, request: &ProviderRequest) -> AnthropicRequest {
        let system = request.system.clone().or_else(|| {
            request
                .messages
                .iter()
                .find(|m| m.role == MessageRole::System)
                .map(|m| m.content.clone())
        });

        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| AnthropicMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages,
            system,
            temperature: request.temperature,
        }
    }
}

/// Map a non-success HTTP status (plus its body) onto an [`LlmError`].
fn classify_status(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        400 => LlmError::InvalidRequest(body),
        429 => LlmError::RateLimited { retry_after_ms: None },
        529 => LlmError::Overloaded(body),
        _ => LlmError::Api { status, message: body },
    }
}

/// Map a reqwest transport failure onto an [`LlmError`].
fn classify_transport(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(err.to_string())
    } else {
        LlmError::Http(err.to_string())
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, LlmError> {
        let body = self.build_request(request);
        let url = self.url("/v1/messages");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), error_body));
        }

        let reply: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = reply
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text.as_str()),
                AnthropicContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(ProviderResponse {
            content,
            model: reply.model,
            usage: Usage::new(reply.usage.input_tokens, reply.usage.output_tokens),
            finish_reason: None,
            stop_reason: reply.stop_reason,
        })
    }
}
