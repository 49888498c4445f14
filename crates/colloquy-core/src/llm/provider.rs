//! LlmProvider trait definition.
//!
//! This is the core abstraction that both backend adapters implement.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition);
//! implementations live in colloquy-infra.

use colloquy_types::llm::{LlmError, ProviderKind, ProviderRequest, ProviderResponse};

/// Trait for LLM provider backends.
///
/// Adapters normalize their backend's request and reply shapes into
/// [`ProviderRequest`] / [`ProviderResponse`] and classify failures into
/// [`LlmError`] variants, so the gateway never sees backend-specific
/// field names or status codes.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "anthropic").
    fn name(&self) -> &str;

    /// Which of the two backends this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Send a chat-completion request and receive the normalized reply.
    fn complete(
        &self,
        request: &ProviderRequest,
    ) -> impl std::future::Future<Output = Result<ProviderResponse, LlmError>> + Send;
}
