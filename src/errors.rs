use thiserror::Error;

use crate::guard::GuardReason;

#[derive(Error, Debug)]
pub enum GuardRagError {
    #[error("Input rejected: {0}")]
    ValidationRejected(GuardReason),

    #[error("Prompt rejected: {0}")]
    PromptRejected(GuardReason),

    #[error("Output rejected: {0}")]
    OutputRejected(GuardReason),

    #[error("Request classified as malicious")]
    IntentRejected,

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Vector service returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed evaluation output: {0}")]
    MalformedEvaluation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GuardRagError {
    /// True for rejections raised by the guard or the intent gate, i.e.
    /// failures that short-circuit before any retrieval work.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ValidationRejected(_)
                | Self::PromptRejected(_)
                | Self::OutputRejected(_)
                | Self::IntentRejected
                | Self::EmptyMessage
        )
    }
}

pub type Result<T> = std::result::Result<T, GuardRagError>;
