//! Second-stage relevance reranking of retrieved candidates

use std::sync::Arc;

use tracing::debug;

use crate::models::Document;
use crate::models::RankedDocument;

/// Scores (query, candidate-text) pairs. One score per text, higher is more
/// relevant.
pub trait RelevanceScorer: Send + Sync {
    fn score_pairs(&self, query: &str, texts: &[&str]) -> Vec<f32>;
}

/// Reorders an initial retrieval's candidates by cross-candidate relevance.
///
/// The scorer is optional: without one the reranker degenerates to the first
/// `top_n` candidates in retrieval order, keeping the pipeline usable.
pub struct Reranker {
    scorer: Option<Arc<dyn RelevanceScorer>>,
}

impl Reranker {
    #[must_use]
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self {
            scorer: Some(scorer),
        }
    }

    #[must_use]
    pub const fn without_scorer() -> Self {
        Self { scorer: None }
    }

    #[must_use]
    pub fn has_scorer(&self) -> bool {
        self.scorer.is_some()
    }

    /// Score and reorder `documents`, returning a new list of at most
    /// `top_n` entries. Input documents are never mutated; ordering is by
    /// descending score with retrieval order breaking ties (stable sort).
    #[must_use]
    pub fn rerank(&self, query: &str, documents: &[Document], top_n: usize) -> Vec<RankedDocument> {
        let Some(scorer) = &self.scorer else {
            return passthrough(documents, top_n);
        };
        if documents.is_empty() {
            return Vec::new();
        }

        let texts: Vec<&str> = documents
            .iter()
            .map(|document| document.content.as_str())
            .collect();
        let scores = scorer.score_pairs(query, &texts);
        if scores.len() != documents.len() {
            debug!(
                "scorer returned {} scores for {} documents; keeping retrieval order",
                scores.len(),
                documents.len()
            );
            return passthrough(documents, top_n);
        }

        let mut ranked: Vec<RankedDocument> = documents
            .iter()
            .cloned()
            .zip(scores)
            .map(|(document, relevance_score)| RankedDocument {
                document,
                relevance_score,
            })
            .collect();

        // Stable: equal scores keep their retrieval order
        ranked.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(top_n);
        ranked
    }
}

/// Retrieval order with rank-derived scores, as used when no scorer is
/// configured.
fn passthrough(documents: &[Document], top_n: usize) -> Vec<RankedDocument> {
    let total = documents.len().max(1);
    documents
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, document)| RankedDocument {
            document: document.clone(),
            relevance_score: 1.0 - (idx as f32 / total as f32),
        })
        .collect()
}

/// Lexical fallback scorer: fraction of query terms present in the
/// candidate text. Cheap, deterministic, and good enough to prefer
/// documents that actually mention the question's vocabulary.
#[derive(Debug, Default)]
pub struct TokenOverlapScorer;

impl RelevanceScorer for TokenOverlapScorer {
    fn score_pairs(&self, query: &str, texts: &[&str]) -> Vec<f32> {
        let query_terms: Vec<String> = tokenize(query);
        if query_terms.is_empty() {
            return vec![0.0; texts.len()];
        }

        texts
            .iter()
            .map(|text| {
                let candidate = text.to_lowercase();
                let matched = query_terms
                    .iter()
                    .filter(|term| candidate.contains(term.as_str()))
                    .count();
                matched as f32 / query_terms.len() as f32
            })
            .collect()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(ToString::to_string)
        .collect()
}
