//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::evaluator::EvaluationReport;
use crate::models::Citation;
use crate::models::ConversationTurn;

/// Message field of a chat request: a bare string, or an object carrying
/// the text under one of several accepted keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    Text(String),
    Structured {
        text: Option<String>,
        content: Option<String>,
        value: Option<String>,
    },
}

impl MessagePayload {
    /// Extract the message text; empty when no accepted key is present.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured {
                text,
                content,
                value,
            } => text
                .or(content)
                .or(value)
                .unwrap_or_default(),
        }
    }
}

/// Chat endpoint request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub message: Option<MessagePayload>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub enable_evaluation: bool,
}

/// Chat endpoint success body.
#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub response: String,
    pub citations: Vec<Citation>,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationReport>,
}

/// Structured error body for every failure class.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Full turn list of one conversation.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<ConversationTurn>,
}

/// Clear endpoint acknowledgement.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
