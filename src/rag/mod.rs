//! Retrieval-augmentation pipeline
//!
//! End-to-end flow for answering a question over the external corpus:
//! - Two-phase retrieval with a draft-answer refinement step
//! - Optional cross-candidate reranking
//! - Length-bounded context assembly with citations
//! - Persona-aware prompt construction
//! - Layered guard checks around generation
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use guardrag::config::AppConfig;
//! use guardrag::conversation::ConversationStore;
//! use guardrag::rag::{ChatRequest, ChatService};
//! use guardrag::retrieval::VectorServiceClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let backend = Arc::new(VectorServiceClient::new(&config.vector)?);
//!     let store = Arc::new(ConversationStore::new());
//!     let service = ChatService::new(backend, store, &config);
//!
//!     let outcome = service
//!         .chat(ChatRequest::new("What mitigations exist for SQL injection?"))
//!         .await?;
//!     println!("Answer: {}", outcome.response);
//!     println!("Sources: {} citations", outcome.citations.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod rerank;

pub use context::files_to_citations;
pub use context::ContextAssembler;
pub use pipeline::ChatOutcome;
pub use pipeline::ChatRequest;
pub use pipeline::ChatService;
pub use pipeline::PipelineSettings;
pub use rerank::RelevanceScorer;
pub use rerank::Reranker;
pub use rerank::TokenOverlapScorer;
