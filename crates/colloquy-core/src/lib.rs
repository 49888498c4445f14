//! Business logic for Colloquy.
//!
//! Contains the [`llm`] module (provider trait, retry policy, completion
//! gateway), the [`cost`] module (pricing table and cost tracker), and
//! the [`context`] module (context store trait). Infrastructure
//! implementations live in `colloquy-infra`.

pub mod context;
pub mod cost;
pub mod llm;
