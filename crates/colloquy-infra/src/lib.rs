//! Infrastructure implementations for Colloquy.
//!
//! Concrete [`colloquy_core::llm::LlmProvider`] adapters (Anthropic,
//! OpenAI), [`colloquy_core::context::ContextStore`] backends (Redis,
//! in-memory), and the `config.toml` loader.

pub mod config;
pub mod llm;
pub mod store;
