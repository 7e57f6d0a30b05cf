//! Scripted backend standing in for the external vector/dialogue services

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::errors::GuardRagError;
use crate::errors::Result;
use crate::models::Document;
use crate::rag::ChatService;
use crate::retrieval::RetrievalApi;

/// Backend whose responses are queued up front. Every call past the script
/// errors, so tests also catch unexpected extra calls.
#[derive(Default)]
pub struct ScriptedBackend {
    search_results: Mutex<VecDeque<Vec<Document>>>,
    dialogue_replies: Mutex<VecDeque<String>>,
    search_calls: AtomicUsize,
    dialogue_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search(&self, documents: Vec<Document>) {
        self.search_results.lock().unwrap().push_back(documents);
    }

    pub fn push_reply(&self, reply: &str) {
        self.dialogue_replies
            .lock()
            .unwrap()
            .push_back(reply.to_string());
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn dialogue_count(&self) -> usize {
        self.dialogue_calls.load(Ordering::SeqCst)
    }

    /// Every prompt sent through `dialogue`, in call order.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalApi for ScriptedBackend {
    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _expr: Option<&str>,
    ) -> Result<Vec<Document>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GuardRagError::Config("unscripted search call".to_string()))
    }

    async fn dialogue(&self, prompt: &str, _max_tokens: usize) -> Result<String> {
        self.dialogue_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.dialogue_replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GuardRagError::Config("unscripted dialogue call".to_string()))
    }
}

pub fn doc(id: &str, content: &str) -> Document {
    Document {
        id: Some(id.to_string()),
        content: content.to_string(),
        metadata: serde_json::Map::new(),
    }
}

/// Chat service over the scripted backend. The reranker is left out so
/// document counts stay exactly as merged.
pub fn service_without_scorer(
    backend: Arc<ScriptedBackend>,
    store: Arc<ConversationStore>,
) -> ChatService {
    let mut config = AppConfig::default();
    config.retrieval.enable_reranker = false;
    ChatService::new(backend, store, &config)
}
