//! Evaluator retry and degradation scenarios over the scripted backend

use std::sync::Arc;

use crate::evaluator::EvaluationReport;
use crate::evaluator::Evaluator;
use crate::tests::support::ScriptedBackend;

fn evaluator(backend: Arc<ScriptedBackend>, max_retries: u32) -> Evaluator {
    Evaluator::new(backend, max_retries, 1024)
}

#[tokio::test]
async fn test_json_wrapped_in_prose_still_parses() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply(
        "Sure, here is the evaluation you asked for:\n\
         {\"accuracy_score\": 27, \"relevance_score\": 21, \"total_score\": 85,\n \
          \"strengths\": [\"grounded in context\"]}\n\
         Let me know if you need anything else.",
    );

    let report = evaluator(backend.clone(), 2)
        .evaluate("question", "context", "answer")
        .await;

    assert_eq!(report.total_score, 85);
    assert_eq!(report.accuracy_score, 27);
    assert_eq!(report.strengths, vec!["grounded in context".to_string()]);
    assert_eq!(backend.dialogue_count(), 1);
}

#[tokio::test]
async fn test_malformed_output_retries_then_succeeds() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply("I would give this roughly a B+.");
    backend.push_reply("{\"accuracy_score\": 20, \"total_score\": 70}");

    let report = evaluator(backend.clone(), 2)
        .evaluate("question", "context", "answer")
        .await;

    assert_eq!(report.total_score, 70);
    assert_eq!(backend.dialogue_count(), 2);

    // The retry prompt carries the strengthened JSON-only instruction
    let prompts = backend.recorded_prompts();
    assert!(!prompts[0].contains("nothing else"));
    assert!(prompts[1].contains("nothing else"));
}

#[tokio::test]
async fn test_exhausted_retries_degrade_to_default_report() {
    let backend = Arc::new(ScriptedBackend::new());
    let max_retries = 2;
    for _ in 0..=max_retries {
        backend.push_reply("still not json, sorry");
    }

    let report = evaluator(backend.clone(), max_retries)
        .evaluate("question", "context", "answer")
        .await;

    assert_eq!(report.total_score, 0);
    assert_eq!(report, EvaluationReport::failed());
    // max_retries + 1 attempts were made
    assert_eq!(backend.dialogue_count(), (max_retries + 1) as usize);
}

#[tokio::test]
async fn test_transport_failure_degrades_without_retry() {
    // Nothing scripted: the dialogue call itself errors
    let backend = Arc::new(ScriptedBackend::new());

    let report = evaluator(backend.clone(), 2)
        .evaluate("question", "context", "answer")
        .await;

    assert_eq!(report, EvaluationReport::failed());
    assert_eq!(backend.dialogue_count(), 1);
}

#[tokio::test]
async fn test_typed_result_surfaces_malformed_kind() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply("prose only");

    let result = evaluator(backend, 0)
        .try_evaluate("question", "context", "answer")
        .await;

    assert!(matches!(
        result,
        Err(crate::errors::GuardRagError::MalformedEvaluation(_))
    ));
}
