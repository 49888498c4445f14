//! Gateway configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.colloquy/` in
//! production) and deserializes it into [`GatewayConfig`]. Falls back
//! to defaults when the file is missing or malformed -- a broken config
//! file degrades to defaults rather than refusing to start.

use std::path::Path;

use colloquy_types::config::GatewayConfig;

/// Load gateway configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`GatewayConfig::default()`].
/// - Unreadable or unparseable file: logs a warning, returns the default.
/// - Valid file: returns the parsed config (absent sections default).
pub async fn load_config(data_dir: &Path) -> GatewayConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
    };

    match toml::from_str::<GatewayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GatewayConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.openai.model, "gpt-4");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[openai]
model = "gpt-4-turbo"
temperature = 0.2

[anthropic]
model = "claude-3-haiku-20240307"

[cost]
enabled = false

[context]
redis_url = "redis://cache.internal:6379/2"
ttl_hours = 12
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.openai.model, "gpt-4-turbo");
        assert!((config.openai.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.anthropic.model, "claude-3-haiku-20240307");
        assert!(!config.cost.enabled);
        assert_eq!(config.context.redis_url, "redis://cache.internal:6379/2");
        assert_eq!(config.context.ttl_hours, 12);
        // Untouched sections keep defaults
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.openai.model, "gpt-4");
        assert!(config.cost.enabled);
    }
}
