//! Conversation context: ordered message history with bounded rotation.
//!
//! A [`ConversationContext`] owns the message sequence for one
//! conversation. Appends go through [`ConversationContext::push`], which
//! applies the rotation policy: system-role messages are never evicted,
//! and at most `max_history` non-system messages are retained (newest
//! win). The serde representation is the persisted shape
//! `{messages, metadata, max_history}` stored by the context store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::llm::{Message, MessageRole};

fn default_max_history() -> usize {
    10
}

/// Ordered message history plus metadata for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
    #[serde(default = "default_max_history")]
    max_history: usize,
}

impl ConversationContext {
    /// Create an empty context. `max_history` is clamped to at least 1.
    pub fn new(max_history: usize) -> Self {
        Self {
            messages: Vec::new(),
            metadata: HashMap::new(),
            max_history: max_history.max(1),
        }
    }

    /// Create a context seeded with one system message.
    pub fn with_system(max_history: usize, system: impl Into<String>) -> Self {
        let mut ctx = Self::new(max_history);
        ctx.push(MessageRole::System, system);
        ctx
    }

    /// Rebuild a context from its persisted parts.
    pub fn from_parts(
        messages: Vec<Message>,
        metadata: HashMap<String, serde_json::Value>,
        max_history: usize,
    ) -> Self {
        Self {
            messages,
            metadata,
            max_history: max_history.max(1),
        }
    }

    /// Append a message, then rotate if the non-system count exceeds
    /// `max_history`.
    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
        self.rotate();
    }

    /// Keep all system messages plus the newest `max_history` non-system
    /// messages, preserving order within each partition.
    fn rotate(&mut self) {
        let non_system = self
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .count();
        if non_system <= self.max_history {
            return;
        }

        let mut system = Vec::new();
        let mut rest = Vec::with_capacity(non_system);
        for msg in self.messages.drain(..) {
            if msg.role == MessageRole::System {
                system.push(msg);
            } else {
                rest.push(msg);
            }
        }
        let keep = rest.split_off(rest.len() - self.max_history);
        system.extend(keep);
        self.messages = system;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Drop all messages and metadata.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.metadata.clear();
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    pub fn metadata_map(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Number of non-system messages currently held.
    pub fn non_system_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .count()
    }
}
