//! Application state wiring the gateway and context store together.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use colloquy_core::context::store::BoxContextStore;
use colloquy_core::cost::CostTracker;
use colloquy_core::llm::{BoxLlmProvider, CompletionGateway, ProviderDefaults, RetryPolicy};
use colloquy_infra::config::load_config;
use colloquy_infra::llm::{AnthropicProvider, OpenAiProvider};
use colloquy_infra::store::{MemoryContextStore, RedisContextStore};
use colloquy_types::config::GatewayConfig;

/// Shared application state used by all REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<CompletionGateway>,
    pub contexts: Arc<BoxContextStore>,
    /// TTL applied to context saves when the request carries none.
    pub context_ttl: Duration,
    pub config: Arc<GatewayConfig>,
}

/// Resolve the data directory: `$COLLOQUY_DATA_DIR`, else `~/.colloquy`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("COLLOQUY_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".colloquy")
}

fn require_env_key(name: &str) -> anyhow::Result<SecretString> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("missing required environment variable {name}"))?;
    Ok(SecretString::from(value))
}

impl AppState {
    /// Initialize the application state: load config, construct the
    /// providers and gateway, connect the context store.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_config(&data_dir).await;

        let openai_key = require_env_key("OPENAI_API_KEY")?;
        let anthropic_key = require_env_key("ANTHROPIC_API_KEY")?;

        let timeout = Duration::from_secs(config.retry.request_timeout_secs);

        let openai = OpenAiProvider::new(&openai_key, timeout);
        let anthropic = AnthropicProvider::new(anthropic_key, timeout);

        let mut gateway = CompletionGateway::new(
            BoxLlmProvider::new(openai),
            ProviderDefaults {
                model: config.openai.model.clone(),
                temperature: Some(config.openai.temperature),
                max_tokens: config.openai.max_tokens,
            },
            BoxLlmProvider::new(anthropic),
            ProviderDefaults {
                model: config.anthropic.model.clone(),
                temperature: None,
                max_tokens: config.anthropic.max_tokens,
            },
            RetryPolicy::from_settings(&config.retry),
        );

        if config.cost.enabled {
            gateway = gateway
                .with_cost_tracker(Arc::new(CostTracker::new(config.cost.alert_threshold)));
        }

        // Prefer Redis; degrade to the in-memory store so the service
        // still serves completions when the cache is down. Contexts
        // then expire with the process.
        let contexts = match RedisContextStore::connect(&config.context.redis_url).await {
            Ok(store) => BoxContextStore::new(store),
            Err(err) => {
                tracing::warn!(
                    url = %config.context.redis_url,
                    error = %err,
                    "redis unavailable, falling back to in-memory context store"
                );
                BoxContextStore::new(MemoryContextStore::new())
            }
        };

        let context_ttl = Duration::from_secs(config.context.ttl_hours * 3600);

        Ok(Self {
            gateway: Arc::new(gateway),
            contexts: Arc::new(contexts),
            context_ttl,
            config: Arc::new(config),
        })
    }
}
