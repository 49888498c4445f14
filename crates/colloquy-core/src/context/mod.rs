//! Conversation context persistence.
//!
//! The [`store::ContextStore`] trait defines the durable key-value
//! interface for conversation histories; implementations live in
//! colloquy-infra (Redis-backed for production, in-memory for tests
//! and development).

pub mod store;

pub use store::{BoxContextStore, ContextKey, ContextStore, DEFAULT_TTL};
