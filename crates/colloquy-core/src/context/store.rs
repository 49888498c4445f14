//! Context store trait: durable, expiring conversation histories.
//!
//! Keys are `(agent_id, context_id)` string pairs, stored under
//! `context:{agent_id}:{context_id}`. The store is a best-effort cache:
//! any underlying connectivity failure is caught, logged, and folded
//! into a `false` / `None` / `0` result. Callers therefore CANNOT
//! distinguish "not found" from "store unreachable" -- this is a
//! deliberate, documented trade-off, not an oversight. Concurrent
//! writers to the same key race and the last save wins; callers needing
//! strict consistency must serialize per key themselves.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;

use colloquy_types::context::ConversationContext;

/// Default expiration applied when a save or TTL refresh passes `None`.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Parsed identity of one stored context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextKey {
    pub agent_id: String,
    pub context_id: String,
}

impl ContextKey {
    /// Render the storage key for this pair.
    pub fn storage_key(&self) -> String {
        storage_key(&self.agent_id, &self.context_id)
    }

    /// Parse a storage key back into its parts. `agent_id` must not
    /// contain `:`; the context id keeps any remaining colons.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("context"), Some(agent_id), Some(context_id))
                if !agent_id.is_empty() && !context_id.is_empty() =>
            {
                Some(Self {
                    agent_id: agent_id.to_string(),
                    context_id: context_id.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Build the storage key for an `(agent_id, context_id)` pair.
pub fn storage_key(agent_id: &str, context_id: &str) -> String {
    format!("context:{agent_id}:{context_id}")
}

/// Key pattern for enumeration, optionally scoped to one agent.
pub fn key_pattern(agent_id: Option<&str>) -> String {
    match agent_id {
        Some(agent_id) => format!("context:{agent_id}:*"),
        None => "context:*".to_string(),
    }
}

/// Durable key-value store of conversation histories with expiration.
///
/// Uses RPITIT (native async fn in traits); implementations live in
/// colloquy-infra. See the module docs for the soft-failure contract.
pub trait ContextStore: Send + Sync {
    /// Serialize and store a context, overwriting any prior value.
    /// `None` TTL means [`DEFAULT_TTL`]. Returns false on failure.
    fn save(
        &self,
        agent_id: &str,
        context_id: &str,
        context: &ConversationContext,
        ttl: Option<Duration>,
    ) -> impl Future<Output = bool> + Send;

    /// Load a context. Absent, expired, and unreachable all yield `None`.
    fn load(
        &self,
        agent_id: &str,
        context_id: &str,
    ) -> impl Future<Output = Option<ConversationContext>> + Send;

    /// Delete a context. Idempotent; deleting a missing key succeeds.
    fn delete(&self, agent_id: &str, context_id: &str) -> impl Future<Output = bool> + Send;

    /// Whether a context currently exists.
    fn exists(&self, agent_id: &str, context_id: &str) -> impl Future<Output = bool> + Send;

    /// Refresh a context's expiration without modifying its content.
    fn extend_ttl(
        &self,
        agent_id: &str,
        context_id: &str,
        ttl: Option<Duration>,
    ) -> impl Future<Output = bool> + Send;

    /// Enumerate stored contexts, optionally filtered by agent. For
    /// administrative use; not transactional with concurrent writes.
    fn list(&self, agent_id: Option<&str>) -> impl Future<Output = Vec<ContextKey>> + Send;

    /// Bulk delete matching contexts, returning how many were removed.
    fn clear_all(&self, agent_id: Option<&str>) -> impl Future<Output = u64> + Send;
}

/// Object-safe version of [`ContextStore`] with boxed futures.
///
/// Same blanket-impl boxing pattern as `BoxLlmProvider`.
pub trait ContextStoreDyn: Send + Sync {
    fn save_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
        context: &'a ConversationContext,
        ttl: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    fn load_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<ConversationContext>> + Send + 'a>>;

    fn delete_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    fn exists_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    fn extend_ttl_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
        ttl: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    fn list_boxed<'a>(
        &'a self,
        agent_id: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Vec<ContextKey>> + Send + 'a>>;

    fn clear_all_boxed<'a>(
        &'a self,
        agent_id: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = u64> + Send + 'a>>;
}

impl<T: ContextStore> ContextStoreDyn for T {
    fn save_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
        context: &'a ConversationContext,
        ttl: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(self.save(agent_id, context_id, context, ttl))
    }

    fn load_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<ConversationContext>> + Send + 'a>> {
        Box::pin(self.load(agent_id, context_id))
    }

    fn delete_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(self.delete(agent_id, context_id))
    }

    fn exists_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(self.exists(agent_id, context_id))
    }

    fn extend_ttl_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        context_id: &'a str,
        ttl: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(self.extend_ttl(agent_id, context_id, ttl))
    }

    fn list_boxed<'a>(
        &'a self,
        agent_id: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Vec<ContextKey>> + Send + 'a>> {
        Box::pin(self.list(agent_id))
    }

    fn clear_all_boxed<'a>(
        &'a self,
        agent_id: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = u64> + Send + 'a>> {
        Box::pin(self.clear_all(agent_id))
    }
}

/// Type-erased context store for runtime backend selection.
pub struct BoxContextStore {
    inner: Box<dyn ContextStoreDyn + Send + Sync>,
}

impl BoxContextStore {
    pub fn new<T: ContextStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn save(
        &self,
        agent_id: &str,
        context_id: &str,
        context: &ConversationContext,
        ttl: Option<Duration>,
    ) -> bool {
        self.inner.save_boxed(agent_id, context_id, context, ttl).await
    }

    pub async fn load(&self, agent_id: &str, context_id: &str) -> Option<ConversationContext> {
        self.inner.load_boxed(agent_id, context_id).await
    }

    pub async fn delete(&self, agent_id: &str, context_id: &str) -> bool {
        self.inner.delete_boxed(agent_id, context_id).await
    }

    pub async fn exists(&self, agent_id: &str, context_id: &str) -> bool {
        self.inner.exists_boxed(agent_id, context_id).await
    }

    pub async fn extend_ttl(
        &self,
        agent_id: &str,
        context_id: &str,
        ttl: Option<Duration>,
    ) -> bool {
        self.inner.extend_ttl_boxed(agent_id, context_id, ttl).await
    }

    pub async fn list(&self, agent_id: Option<&str>) -> Vec<ContextKey> {
        self.inner.list_boxed(agent_id).await
    }

    pub async fn clear_all(&self, agent_id: Option<&str>) -> u64 {
        self.inner.clear_all_boxed(agent_id).await
    }
}
