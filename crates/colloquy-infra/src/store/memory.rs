//! In-memory context store.
//!
//! Same observable semantics as the Redis backend -- keys, TTL expiry,
//! soft failures -- backed by a [`DashMap`]. Expired entries are
//! dropped lazily on access. Intended for tests and development
//! without a Redis instance; contents do not survive a restart.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use colloquy_core::context::store::{key_pattern, storage_key, ContextKey, ContextStore, DEFAULT_TTL};
use colloquy_types::context::ConversationContext;

struct StoredEntry {
    /// Serialized context, so load hands back an independent copy just
    /// like a real round-trip through Redis.
    json: String,
    expires_at: Instant,
}

impl StoredEntry {
    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory expiring context store.
#[derive(Default)]
pub struct MemoryContextStore {
    entries: DashMap<String, StoredEntry>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a stored key against the enumeration pattern
    /// (`context:{agent}:*` or `context:*`).
    fn matches(key: &str, pattern: &str) -> bool {
        let prefix = pattern.trim_end_matches('*');
        key.starts_with(prefix)
    }
}

impl ContextStore for MemoryContextStore {
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
        let ttl = ttl.unwrap_or(DEFAULT_TTL);
        self.entries.insert(
            storage_key(agent_id, context_id),
            StoredEntry {
                json,
                expires_at: Instant::now() + ttl,
            },
        );
        tracing::debug!(
            agent_id,
            context_id,
            message_count = context.len(),
            ttl_secs = ttl.as_secs(),
            "context saved"
        );
        true
    }

    async fn load(&self, agent_id: &str, context_id: &str) -> Option<ConversationContext> {
        let key = storage_key(agent_id, context_id);
        let json = {
            let entry = self.entries.get(&key)?;
            if entry.expired() {
                drop(entry);
                self.entries.remove(&key);
                return None;
            }
            entry.json.clone()
        };

        match serde_json::from_str(&json) {
            Ok(context) => Some(context),
            Err(err) => {
                tracing::error!(agent_id, context_id, error = %err, "context deserialization failed");
                None
            }
        }
    }

    async fn delete(&self, agent_id: &str, context_id: &str) -> bool {
        self.entries.remove(&storage_key(agent_id, context_id));
        true
    }

    async fn exists(&self, agent_id: &str, context_id: &str) -> bool {
        let key = storage_key(agent_id, context_id);
        // The map guard must be released before removing, or the shard
        // lock would deadlock.
        let expired = match self.entries.get(&key) {
            Some(entry) => entry.expired(),
            None => return false,
        };
        if expired {
            self.entries.remove(&key);
            return false;
        }
        true
    }

    async fn extend_ttl(&self, agent_id: &str, context_id: &str, ttl: Option<Duration>) -> bool {
        let key = storage_key(agent_id, context_id);
        match self.entries.get_mut(&key) {
            Some(mut entry) if !entry.expired() => {
                entry.expires_at = Instant::now() + ttl.unwrap_or(DEFAULT_TTL);
                true
            }
            _ => false,
        }
    }

    async fn list(&self, agent_id: Option<&str>) -> Vec<ContextKey> {
        let pattern = key_pattern(agent_id);
        self.entries
            .iter()
            .filter(|entry| !entry.value().expired())
            .filter(|entry| Self::matches(entry.key(), &pattern))
            .filter_map(|entry| ContextKey::parse(entry.key()))
            .collect()
    }

    async fn clear_all(&self, agent_id: Option<&str>) -> u64 {
        let pattern = key_pattern(agent_id);
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| Self::matches(entry.key(), &pattern))
            .map(|entry| entry.key().clone())
            .collect();

        let mut deleted = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                deleted += 1;
            }
        }
        deleted
    }
}
