//! Conversation history with an explicit retention policy.
//!
//! History is owned here, outside the per-turn parser state. At each turn
//! boundary the retention policy keeps the system entry plus the most
//! recent K entries once the history grows past its configured maximum,
//! bounding prompt size across long sessions.

use crate::config::ConversationConfig;

/// Author of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Fixed instruction entry, never truncated away.
    System,
    /// The user's transcribed input.
    User,
    /// The assistant's full (raw) response.
    Assistant,
}

/// One conversation history entry.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Who authored the entry.
    pub role: Role,
    /// Entry text.
    pub content: String,
}

/// Role-tagged conversation history with size-bounded retention.
pub struct Conversation {
    entries: Vec<HistoryEntry>,
    config: ConversationConfig,
}

impl Conversation {
    /// Create an empty history.
    pub fn new(config: ConversationConfig) -> Self {
        Self {
            entries: Vec::new(),
            config,
        }
    }

    /// Create a history seeded with a system prompt.
    pub fn with_system_prompt(config: ConversationConfig, prompt: &str) -> Self {
        let mut conversation = Self::new(config);
        conversation.entries.push(HistoryEntry {
            role: Role::System,
            content: prompt.to_owned(),
        });
        conversation
    }

    /// All entries in order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record one completed turn and apply the retention policy.
    ///
    /// The assistant text should be the raw response (tags included) so the
    /// model sees its own tag usage in context.
    pub fn record_turn(&mut self, user_text: &str, assistant_text: &str) {
        self.entries.push(HistoryEntry {
            role: Role::User,
            content: user_text.to_owned(),
        });
        self.entries.push(HistoryEntry {
            role: Role::Assistant,
            content: assistant_text.to_owned(),
        });
        self.apply_retention();
    }

    /// Truncate to the system entry plus the most recent
    /// `keep_recent_entries` once the history exceeds `max_entries`.
    pub fn apply_retention(&mut self) {
        if self.entries.len() <= self.config.max_entries {
            return;
        }
        let system = self
            .entries
            .first()
            .filter(|e| e.role == Role::System)
            .cloned();
        let keep_from = self.entries.len() - self.config.keep_recent_entries;
        let recent = self.entries.split_off(keep_from);
        self.entries = system.into_iter().chain(recent).collect();
    }
}
