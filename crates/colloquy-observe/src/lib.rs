//! Observability setup for Colloquy.
//!
//! [`tracing_setup`] initializes the global tracing subscriber with
//! structured logging and optional OpenTelemetry export;
//! [`genai_attrs`] provides OTel GenAI semantic-convention attribute
//! names for LLM call instrumentation.

pub mod genai_attrs;
pub mod tracing_setup;
