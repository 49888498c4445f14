//! Redis-backed context store.
//!
//! Persists serialized conversation contexts under
//! `context:{agent_id}:{context_id}` with SETEX-managed expiration.
//! Every operation catches connectivity failures, logs them, and folds
//! them into the soft-failure result shape -- the store never raises to
//! its caller, so "not found" and "Redis unreachable" are observably
//! identical (see the [`ContextStore`] trait docs).

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use colloquy_core::context::store::{key_pattern, storage_key, ContextKey, ContextStore, DEFAULT_TTL};
use colloquy_types::context::ConversationContext;

/// SCAN batch size hint, matching the administrative (non-hot-path)
/// nature of enumeration.
const SCAN_COUNT: u64 = 100;

/// Redis context store over a multiplexed connection manager.
pub struct RedisContextStore {
    conn: ConnectionManager,
}

impl RedisContextStore {
    /// Connect to Redis and verify the connection with a PING.
    ///
    /// Connection establishment is the one place that surfaces the
    /// error: a service that cannot reach Redis at startup should know.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_connection_manager().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        tracing::info!(url, "redis connected");
        Ok(Self { conn })
    }

    /// Collect all keys matching the pattern via cursor-driven SCAN.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, redis::RedisError> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }
}

impl ContextStore for RedisContextStore {
    async fn save(
        &self,
        agent_id: &str,
        context_id: &str,
        context: &ConversationContext,
        ttl: Option<Duration>,
    ) -> bool {
        let json = match serde_json::to_string(context) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context serialization failed");
                return false;
            }
        };

        let key = storage_key(agent_id, context_id);
        let ttl = ttl.unwrap_or(DEFAULT_TTL);
        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&key, json, ttl.as_secs()).await {
            Ok(()) => {
                tracing::debug!(
                    agent_id,
                    context_id,
                    message_count = context.len(),
                    ttl_secs = ttl.as_secs(),
                    "context saved"
                );
                true
            }
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context save failed");
                false
            }
        }
    }

    async fn load(&self, agent_id: &str, context_id: &str) -> Option<ConversationContext> {
        let key = storage_key(agent_id, context_id);
        let mut conn = self.conn.clone();
        let data: Option<String> = match conn.get(&key).await {
            Ok(data) => data,
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context load failed");
                return None;
            }
        };

        let json = data?;
        match serde_json::from_str(&json) {
            Ok(context) => Some(context),
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context deserialization failed");
                None
            }
        }
    }

    async fn delete(&self, agent_id: &str, context_id: &str) -> bool {
        let key = storage_key(agent_id, context_id);
        let mut conn = self.conn.clone();
        match conn.del::<_, u64>(&key).await {
            Ok(existed) => {
                tracing::debug!(agent_id, context_id, existed = existed > 0, "context deleted");
                true
            }
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context delete failed");
                false
            }
        }
    }

    async fn exists(&self, agent_id: &str, context_id: &str) -> bool {
        let key = storage_key(agent_id, context_id);
        let mut conn = self.conn.clone();
        match conn.exists::<_, bool>(&key).await {
            Ok(exists) => exists,
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context exists check failed");
                false
            }
        }
    }

    async fn extend_ttl(&self, agent_id: &str, context_id: &str, ttl: Option<Duration>) -> bool {
        let key = storage_key(agent_id, context_id);
        let ttl = ttl.unwrap_or(DEFAULT_TTL);
        let mut conn = self.conn.clone();
        match conn.expire::<_, bool>(&key, ttl.as_secs() as i64).await {
            Ok(applied) => {
                tracing::debug!(agent_id, context_id, ttl_secs = ttl.as_secs(), applied, "context ttl extended");
                applied
            }
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context ttl extend failed");
                false
            }
        }
    }

    async fn list(&self, agent_id: Option<&str>) -> Vec<ContextKey> {
        let pattern = key_pattern(agent_id);
        match self.scan_keys(&pattern).await {
            Ok(keys) => keys.iter().filter_map(|k| ContextKey::parse(k)).collect(),
            Err(err) => {
                tracing::error!(agent_id, error = %err, "context list failed");
                Vec::new()
            }
        }
    }

    async fn clear_all(&self, agent_id: Option<&str>) -> u64 {
        let pattern = key_pattern(agent_id);
        let keys = match self.scan_keys(&pattern).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::error!(agent_id, error = %err, "context clear failed");
                return 0;
            }
        };
        if keys.is_empty() {
            return 0;
        }

        let mut conn = self.conn.clone();
        match conn.del::<_, u64>(keys).await {
            Ok(deleted) => {
                tracing::info!(agent_id, deleted, "contexts cleared");
                deleted
            }
            Err(err) => {
                tracing::error!(agent_id, error = %err, "context clear failed");
                0
            }
        }
    }
}
