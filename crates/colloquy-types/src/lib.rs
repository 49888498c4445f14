//! Shared domain types for Colloquy.
//!
//! Pure data shapes and error enums used across the workspace: LLM
//! request/response types, conversation contexts, cost records, and
//! configuration. No I/O lives here.

pub mod config;
pub mod context;
pub mod cost;
pub mod error;
pub mod llm;
