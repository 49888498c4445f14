//! LLM provider implementations.
//!
//! Contains the two concrete implementations of the [`LlmProvider`]
//! trait defined in `colloquy-core`: [`AnthropicProvider`] (system
//! instruction as a dedicated request field) and [`OpenAiProvider`]
//! (system instruction inlined in the message list).
//!
//! [`LlmProvider`]: colloquy_core::llm::LlmProvider

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
