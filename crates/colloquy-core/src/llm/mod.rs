//! Completion gateway and its collaborators.
//!
//! [`provider::LlmProvider`] is the contract every backend adapter
//! implements; [`box_provider::BoxLlmProvider`] erases it for runtime
//! selection. [`retry::RetryPolicy`] wraps a single adapter call in
//! bounded exponential backoff. [`gateway::CompletionGateway`] ties
//! adapter selection, retry, cross-provider fallback, and cost tracking
//! together.

pub mod box_provider;
pub mod gateway;
pub mod provider;
pub mod retry;

pub use box_provider::BoxLlmProvider;
pub use gateway::{CompletionGateway, ProviderDefaults};
pub use provider::LlmProvider;
pub use retry::RetryPolicy;
