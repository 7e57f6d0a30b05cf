//! Core data models for retrieved documents, citations, and conversations

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A document returned by the external search service.
///
/// Immutable once retrieved. The identifier may be absent; deduplication
/// then falls back to the metadata source, and finally to the raw content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Create a document with content only.
    #[must_use]
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Key used when merging retrieval phases: identifier, else the
    /// metadata `source` string, else the raw content.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        if let Some(source) = self.metadata.get("source").and_then(Value::as_str) {
            return source.to_string();
        }
        self.content.clone()
    }

    /// Identifier used in citations; `unknown` when nothing usable exists.
    #[must_use]
    pub fn citation_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| "unknown".to_string())
    }
}

/// A document paired with its relevance score from the reranker.
#[derive(Debug, Clone)]
pub struct RankedDocument {
    pub document: Document,
    pub relevance_score: f32,
}

/// Citation derived 1:1 from the final document list, in rank order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// 1-based, contiguous, stable per response.
    pub ordinal: usize,
    pub source_id: String,
    pub snippet: String,
    pub link: String,
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation id and title, as listed by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
}
