//! Clients for the external vector-store and dialogue services
//!
//! The pipeline talks to the outside world through [`RetrievalApi`]; the
//! production implementation is [`VectorServiceClient`]. Tests substitute a
//! scripted in-memory backend.

pub mod client;

pub use client::UploadRecord;
pub use client::VectorServiceClient;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::Document;

/// Search and dialogue calls against the external services.
///
/// Implementations must apply their own request timeout; the chat path never
/// retries a failed call.
#[async_trait]
pub trait RetrievalApi: Send + Sync {
    /// Top-k similarity search. A malformed or missing result list is an
    /// empty result set, not an error.
    async fn search(&self, query: &str, top_k: usize, expr: Option<&str>) -> Result<Vec<Document>>;

    /// Single-turn generation call with the fully assembled prompt.
    async fn dialogue(&self, prompt: &str, max_tokens: usize) -> Result<String>;
}
