//! Two-phase retrieval orchestrator: the central control flow of a chat
//! request.
//!
//! Per request: intent gate -> initial search -> draft answer -> refined
//! search -> merge/dedupe -> rerank -> context + citations -> guarded
//! prompt -> generation -> conversation append -> optional evaluation.
//! The conversation append is the single state-mutating step and happens
//! only after a successful generation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::errors::GuardRagError;
use crate::errors::Result;
use crate::evaluator::EvaluationReport;
use crate::evaluator::Evaluator;
use crate::guard::Guard;
use crate::models::Citation;
use crate::models::Document;
use crate::personality::detect_personality;
use crate::rag::context::files_to_citations;
use crate::rag::context::ContextAssembler;
use crate::rag::prompts;
use crate::rag::rerank::Reranker;
use crate::rag::rerank::TokenOverlapScorer;
use crate::retrieval::RetrievalApi;

/// Token cap for the one-word intent label.
const INTENT_MAX_TOKENS: usize = 8;

/// Tunables of the chat pipeline, taken from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Result count for the initial (raw-question) search.
    pub initial_top_k: usize,
    /// Result count for the refined (draft-as-query) search.
    pub refine_top_k: usize,
    /// Documents kept after reranking.
    pub rerank_top_n: usize,
    pub draft_max_tokens: usize,
    pub answer_max_tokens: usize,
    /// Apply the third guard layer to the model's raw reply.
    pub validate_output: bool,
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            initial_top_k: config.retrieval.default_top_k,
            refine_top_k: config.retrieval.refine_top_k,
            rerank_top_n: config.retrieval.rerank_top_n,
            draft_max_tokens: config.generation.draft_max_tokens,
            answer_max_tokens: config.generation.answer_max_tokens,
            validate_output: config.guard.validate_output,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// One chat request into the pipeline.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    pub enable_evaluation: bool,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            enable_evaluation: false,
        }
    }
}

/// Successful pipeline output.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response: String,
    pub citations: Vec<Citation>,
    pub conversation_id: String,
    pub evaluation: Option<EvaluationReport>,
}

/// Complete chat service over an injected retrieval backend.
pub struct ChatService {
    backend: Arc<dyn RetrievalApi>,
    store: Arc<ConversationStore>,
    guard: Guard,
    reranker: Reranker,
    assembler: ContextAssembler,
    evaluator: Evaluator,
    settings: PipelineSettings,
}

impl ChatService {
    /// Build the service from configuration, wiring the default lexical
    /// scorer when reranking is enabled.
    #[must_use]
    pub fn new(
        backend: Arc<dyn RetrievalApi>,
        store: Arc<ConversationStore>,
        config: &AppConfig,
    ) -> Self {
        let reranker = if config.retrieval.enable_reranker {
            Reranker::new(Arc::new(TokenOverlapScorer))
        } else {
            Reranker::without_scorer()
        };

        Self::from_parts(
            backend.clone(),
            store,
            Guard::from_config(&config.guard),
            reranker,
            ContextAssembler::new(config.retrieval.max_context_length),
            Evaluator::new(
                backend,
                config.evaluation.max_retries,
                config.generation.answer_max_tokens,
            ),
            PipelineSettings::from_config(config),
        )
    }

    /// Assemble from explicit parts.
    #[must_use]
    pub fn from_parts(
        backend: Arc<dyn RetrievalApi>,
        store: Arc<ConversationStore>,
        guard: Guard,
        reranker: Reranker,
        assembler: ContextAssembler,
        evaluator: Evaluator,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            backend,
            store,
            guard,
            reranker,
            assembler,
            evaluator,
            settings,
        }
    }

    /// Process one chat request end to end.
    ///
    /// Guard and intent failures short-circuit before any retrieval work or
    /// state mutation; retrieval and generation failures propagate to the
    /// caller untouched for uniform conversion at the surface.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome> {
        let user_input = request.message.trim();
        if user_input.is_empty() {
            return Err(GuardRagError::EmptyMessage);
        }

        // Layer 1: input validation
        let verdict = self.guard.validate_input(user_input);
        if let Some(reason) = verdict.reason {
            return Err(GuardRagError::ValidationRejected(reason));
        }

        // Intent gate: fail closed on anything that is not exactly benign
        self.screen_intent(user_input).await?;

        let persona = detect_personality(user_input);
        let conversation_id = self.store.resolve_id(request.conversation_id.as_deref());
        info!(
            "chat request accepted: conversation={} persona={}",
            conversation_id,
            persona.name()
        );

        // Phase 1: search with the raw question, then draft
        let initial = self
            .backend
            .search(user_input, self.settings.initial_top_k, None)
            .await?;
        let draft = self.draft_answer(user_input, &initial).await?;

        // Phase 2: the draft carries domain vocabulary closer to the corpus
        // than the original phrasing, so search again with it
        let refined = self
            .backend
            .search(&draft, self.settings.refine_top_k, None)
            .await?;
        debug!(
            "two-phase retrieval: {} initial, {} refined",
            initial.len(),
            refined.len()
        );

        let merged = merge_phases(initial, refined);

        // Rerank when a scorer is attached; otherwise the merged order is
        // already the best ordering available
        let final_documents: Vec<Document> = if self.reranker.has_scorer() {
            self.reranker
                .rerank(user_input, &merged, self.settings.rerank_top_n)
                .into_iter()
                .map(|ranked| ranked.document)
                .collect()
        } else {
            merged
        };

        let context = self.assembler.extract_context(&final_documents);
        let citations = files_to_citations(&final_documents);

        // Layer 2: prompt validation over the full assembly, with the real
        // session history this time
        let history = self.store.history(&conversation_id);
        let prompt =
            prompts::build_chat_prompt(persona, &history, user_input, &context, &citations);
        let verdict = self.guard.validate_prompt(&prompt);
        if let Some(reason) = verdict.reason {
            return Err(GuardRagError::PromptRejected(reason));
        }

        let response = self
            .backend
            .dialogue(&prompt, self.settings.answer_max_tokens)
            .await?;

        // Layer 3: output validation (defense in depth, configurable)
        if self.settings.validate_output {
            let verdict = self.guard.validate_output(&response);
            if let Some(reason) = verdict.reason {
                return Err(GuardRagError::OutputRejected(reason));
            }
        }

        // The single state mutation, after everything that can fail
        self.store
            .append_exchange(&conversation_id, user_input, &response);

        let evaluation = if request.enable_evaluation {
            Some(self.evaluator.evaluate(user_input, &context, &response).await)
        } else {
            None
        };

        Ok(ChatOutcome {
            response,
            citations,
            conversation_id,
            evaluation,
        })
    }

    /// Classification pre-check. A transport failure propagates as a server
    /// error; any label other than `benign` is a terminal rejection.
    async fn screen_intent(&self, user_input: &str) -> Result<()> {
        let prompt = prompts::build_intent_prompt(user_input);
        let label = self.backend.dialogue(&prompt, INTENT_MAX_TOKENS).await?;

        if label.trim().eq_ignore_ascii_case("benign") {
            Ok(())
        } else {
            warn!("intent gate rejected request: label={:?}", label.trim());
            Err(GuardRagError::IntentRejected)
        }
    }

    /// Phase-1 draft: generated against an empty history so prior turns do
    /// not bias the refinement query. Without initial results the raw
    /// question itself serves as the draft.
    async fn draft_answer(&self, user_input: &str, initial: &[Document]) -> Result<String> {
        if initial.is_empty() {
            return Ok(user_input.to_string());
        }

        let draft_context = self.assembler.extract_context(initial);
        let prompt = prompts::build_draft_prompt(user_input, &draft_context);
        let draft = self
            .backend
            .dialogue(&prompt, self.settings.draft_max_tokens)
            .await?;

        // An empty draft would degrade phase 2 to a no-op query
        if draft.trim().is_empty() {
            Ok(user_input.to_string())
        } else {
            Ok(draft)
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }
}

/// Merge the two retrieval phases, deduplicating by `dedup_key`. The last
/// occurrence wins (refined results override initial ones on conflict)
/// while the order stays first-seen-to-last-kept.
fn merge_phases(initial: Vec<Document>, refined: Vec<Document>) -> Vec<Document> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, Document> = HashMap::new();

    for document in initial.into_iter().chain(refined) {
        let key = document.dedup_key();
        if !by_key.contains_key(&key) {
            order.push(key.clone());
        }
        by_key.insert(key, document);
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, content: &str) -> Document {
        Document {
            id: Some(id.to_string()),
            content: content.to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_merge_keeps_refined_version_on_conflict() {
        let initial = vec![doc("a", "initial-a"), doc("b", "initial-b")];
        let refined = vec![doc("b", "refined-b"), doc("c", "refined-c")];

        let merged = merge_phases(initial, refined);

        assert_eq!(merged.len(), 3);
        let b = merged.iter().find(|d| d.id.as_deref() == Some("b")).unwrap();
        assert_eq!(b.content, "refined-b");
    }

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let initial = vec![doc("a", "1"), doc("b", "2")];
        let refined = vec![doc("c", "3"), doc("a", "4")];

        let merged = merge_phases(initial, refined);

        let ids: Vec<&str> = merged.iter().filter_map(|d| d.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged[0].content, "4");
    }

    #[test]
    fn test_merge_counts_three_plus_five_with_one_overlap() {
        let initial = vec![doc("a", "1"), doc("b", "2"), doc("c", "3")];
        let refined = vec![
            doc("c", "3-refined"),
            doc("d", "4"),
            doc("e", "5"),
            doc("f", "6"),
            doc("g", "7"),
        ];

        let merged = merge_phases(initial, refined);
        assert_eq!(merged.len(), 7);
    }

    #[test]
    fn test_merge_dedups_by_content_when_unidentified() {
        let initial = vec![Document::from_content("same text")];
        let refined = vec![Document::from_content("same text")];
        assert_eq!(merge_phases(initial, refined).len(), 1);
    }
}
