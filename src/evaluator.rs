//! Post-hoc answer quality scoring via a structured-output model call
//!
//! Evaluation is best-effort: the typed retry loop lives in
//! `try_evaluate`, and only the policy boundary (`evaluate`) converts an
//! exhausted or failed run into the default zero-score report. A failed
//! evaluation never blocks answer delivery.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::errors::GuardRagError;
use crate::errors::Result;
use crate::retrieval::RetrievalApi;

/// Fixed-schema scoring record. Sub-score bounds: accuracy 30, relevance 25,
/// completeness 20, clarity 15, format 10; total is their sum.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    #[serde(default)]
    pub accuracy_score: u32,
    #[serde(default)]
    pub relevance_score: u32,
    #[serde(default)]
    pub completeness_score: u32,
    #[serde(default)]
    pub clarity_score: u32,
    #[serde(default)]
    pub format_score: u32,
    #[serde(default)]
    pub total_score: u32,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub optimized_prompt: String,
}

impl EvaluationReport {
    /// The all-zero record returned when no valid evaluation could be
    /// obtained.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            weaknesses: vec!["Could not obtain a valid evaluation from the model".to_string()],
            suggestions: vec!["Check the evaluation prompt or the model configuration".to_string()],
            ..Self::default()
        }
    }
}

/// Evaluator over the dialogue call, with bounded retry on malformed JSON.
pub struct Evaluator {
    backend: Arc<dyn RetrievalApi>,
    max_retries: u32,
    max_tokens: usize,
}

impl Evaluator {
    #[must_use]
    pub fn new(backend: Arc<dyn RetrievalApi>, max_retries: u32, max_tokens: usize) -> Self {
        Self {
            backend,
            max_retries,
            max_tokens,
        }
    }

    /// Score an answer. Absorbs every failure into the default report; this
    /// is the policy boundary, the inner loop stays typed.
    pub async fn evaluate(&self, question: &str, context: &str, answer: &str) -> EvaluationReport {
        match self.try_evaluate(question, context, answer).await {
            Ok(report) => report,
            Err(e) => {
                warn!("evaluation degraded to default report: {}", e);
                EvaluationReport::failed()
            }
        }
    }

    /// Typed evaluation attempt: dialogue call, JSON extraction, bounded
    /// retry with a strengthened JSON-only instruction.
    pub async fn try_evaluate(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> Result<EvaluationReport> {
        for attempt in 0..=self.max_retries {
            let strict = attempt > 0;
            let prompt = build_evaluation_prompt(question, context, answer, strict);
            let raw = self.backend.dialogue(&prompt, self.max_tokens).await?;
            debug!("evaluation attempt {}: {} chars", attempt + 1, raw.len());

            match parse_report(&raw) {
                Ok(report) => return Ok(report),
                Err(e) => {
                    warn!("evaluation attempt {} unparseable: {}", attempt + 1, e);
                }
            }
        }

        Err(GuardRagError::MalformedEvaluation(format!(
            "no valid JSON after {} attempts",
            self.max_retries + 1
        )))
    }
}

lazy_static! {
    /// Outermost brace-delimited span, dotall so the object may span lines.
    static ref JSON_SPAN: Regex = Regex::new(r"(?s)\{.*\}").expect("invalid JSON span pattern");
}

/// Parse a report out of a model reply: first the outermost `{...}` span,
/// then the whole reply as a fallback.
pub fn parse_report(raw: &str) -> Result<EvaluationReport> {
    if let Some(found) = JSON_SPAN.find(raw) {
        if let Ok(report) = serde_json::from_str(found.as_str()) {
            return Ok(report);
        }
    }
    serde_json::from_str(raw).map_err(|e| GuardRagError::MalformedEvaluation(e.to_string()))
}

fn build_evaluation_prompt(question: &str, context: &str, answer: &str, strict: bool) -> String {
    let reinforcement = if strict {
        "\nReturn strictly the JSON object and nothing else: no prose, no\ncode fences, no commentary.\n"
    } else {
        ""
    };

    format!(
        r#"You are a quality reviewer for retrieval-grounded answers. Score the
assistant answer below against these criteria:
1. Accuracy (up to 30): factually correct and grounded in the context
2. Relevance (up to 25): addresses the question without digressions
3. Completeness (up to 20): covers the question's key points
4. Clarity (up to 15): well organized and plainly worded
5. Format and citations (up to 10): citations marked, layout appropriate
{reinforcement}
Respond with a JSON object of exactly this shape:
{{
    "accuracy_score": 0,
    "relevance_score": 0,
    "completeness_score": 0,
    "clarity_score": 0,
    "format_score": 0,
    "total_score": 0,
    "strengths": ["..."],
    "weaknesses": ["..."],
    "suggestions": ["..."],
    "optimized_prompt": ""
}}

[Question]
{question}

[Context]
{context}

[Assistant answer]
{answer}

JSON evaluation:"#
    )
}
