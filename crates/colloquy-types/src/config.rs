//! Gateway configuration types.
//!
//! `GatewayConfig` represents the top-level `config.toml`. All fields
//! have defaults so a missing or partial file still yields a working
//! configuration. API keys are NOT part of this file; they come from
//! the environment (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`).

use serde::{Deserialize, Serialize};

/// Top-level configuration for the completion gateway service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub anthropic: AnthropicSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub cost: CostSettings,
    #[serde(default)]
    pub context: ContextSettings,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Defaults for the OpenAI provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f64,
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_openai_temperature() -> f64 {
    0.7
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
            temperature: default_openai_temperature(),
        }
    }
}

/// Defaults for the Anthropic provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicSettings {
    #[serde(default = "default_anthropic_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_anthropic_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Retry and per-attempt timeout knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    /// Timeout applied to each outbound provider call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_secs() -> u64 {
    2
}

fn default_max_delay_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Cost tracking switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSettings {
    #[serde(default = "default_cost_enabled")]
    pub enabled: bool,
    /// Running-total threshold (USD) that triggers the alert log.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
}

fn default_cost_enabled() -> bool {
    true
}

fn default_alert_threshold() -> f64 {
    100.0
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            enabled: default_cost_enabled(),
            alert_threshold: default_alert_threshold(),
        }
    }
}

/// Context store connection and expiry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSettings {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Contexts expire this long after their last write.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_ttl_hours() -> u64 {
    24
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.openai.model, "gpt-4");
        assert_eq!(config.anthropic.model, "claude-3-sonnet-20240229");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_secs, 2);
        assert_eq!(config.retry.max_delay_secs, 10);
        assert!(config.cost.enabled);
        assert!((config.cost.alert_threshold - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.context.ttl_hours, 24);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.openai.max_tokens, 2000);
        assert_eq!(config.retry.request_timeout_secs, 30);
        assert_eq!(config.context.redis_url, "redis://localhost:6379/0");
    }

    #[test]
    fn test_deserialize_partial_toml_overrides() {
        let config: GatewayConfig = toml::from_str(
            r#"
[openai]
model = "gpt-4-turbo"

[cost]
alert_threshold = 25.0

[context]
ttl_hours = 6
"#,
        )
        .unwrap();
        assert_eq!(config.openai.model, "gpt-4-turbo");
        // Untouched sections keep their defaults
        assert_eq!(config.openai.max_tokens, 2000);
        assert!((config.cost.alert_threshold - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.context.ttl_hours, 6);
        assert_eq!(config.anthropic.model, "claude-3-sonnet-20240229");
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = GatewayConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let restored: GatewayConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.openai.model, config.openai.model);
        assert_eq!(restored.retry.max_attempts, config.retry.max_attempts);
    }
}
