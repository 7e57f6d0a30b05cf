//! In-memory conversation store
//!
//! Conversations are created lazily when the first exchange is appended and
//! live for the process lifetime; the only destructive operation is the
//! explicit clear-all. Appends within one conversation happen under that
//! entry's shard lock, and different conversations never contend.

use dashmap::DashMap;
use uuid::Uuid;

use crate::models::ConversationSummary;
use crate::models::ConversationTurn;

/// Titles are the first user message, truncated to this many characters.
pub const TITLE_MAX_CHARS: usize = 30;

/// A single conversation: opaque id, derived title, ordered turns.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub turns: Vec<ConversationTurn>,
}

/// Concurrent map of conversation id to history.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: DashMap<String, Conversation>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            conversations: DashMap::new(),
        }
    }

    /// Resolve the id for this request: a known id is kept, anything else
    /// gets a fresh one. The entry itself is NOT created here - the store is
    /// only mutated by `append_exchange`, after a successful generation.
    #[must_use]
    pub fn resolve_id(&self, requested: Option<&str>) -> String {
        match requested {
            Some(id) if self.conversations.contains_key(id) => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        }
    }

    /// Turns of the given conversation, empty for an id not yet stored.
    #[must_use]
    pub fn history(&self, id: &str) -> Vec<ConversationTurn> {
        self.conversations
            .get(id)
            .map(|conversation| conversation.turns.clone())
            .unwrap_or_default()
    }

    /// Turns of the given conversation, `None` when the id is unknown.
    #[must_use]
    pub fn turns(&self, id: &str) -> Option<Vec<ConversationTurn>> {
        self.conversations
            .get(id)
            .map(|conversation| conversation.turns.clone())
    }

    /// Append a completed `(user, assistant)` exchange, creating the
    /// conversation (and deriving its title) on first use.
    pub fn append_exchange(&self, id: &str, user_message: &str, assistant_message: &str) {
        let mut entry = self
            .conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation {
                id: id.to_string(),
                title: derive_title(user_message),
                turns: Vec::new(),
            });
        entry.turns.push(ConversationTurn::user(user_message));
        entry
            .turns
            .push(ConversationTurn::assistant(assistant_message));
    }

    /// Id and title of every conversation, id-descending.
    #[must_use]
    pub fn list_summaries(&self) -> Vec<ConversationSummary> {
        let mut summaries: Vec<ConversationSummary> = self
            .conversations
            .iter()
            .map(|entry| ConversationSummary {
                id: entry.id.clone(),
                title: entry.title.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| b.id.cmp(&a.id));
        summaries
    }

    /// Drop every conversation.
    pub fn clear(&self) {
        self.conversations.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// First user message, truncated to `TITLE_MAX_CHARS` characters with an
/// ellipsis when longer.
fn derive_title(first_message: &str) -> String {
    if first_message.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = first_message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        first_message.to_string()
    }
}
