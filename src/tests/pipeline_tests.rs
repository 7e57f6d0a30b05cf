//! End-to-end pipeline scenarios over the scripted backend

use std::sync::Arc;

use crate::conversation::ConversationStore;
use crate::errors::GuardRagError;
use crate::guard::GuardReason;
use crate::rag::ChatRequest;
use crate::tests::support::doc;
use crate::tests::support::service_without_scorer;
use crate::tests::support::ScriptedBackend;

fn request(message: &str) -> ChatRequest {
    ChatRequest::new(message)
}

#[tokio::test]
async fn test_sql_input_rejected_before_any_backend_call() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store.clone());

    let result = service.chat(request("SELECT * FROM users")).await;

    match result {
        Err(GuardRagError::ValidationRejected(reason)) => {
            assert_eq!(reason, GuardReason::SqlPattern);
        }
        other => panic!("expected validation rejection, got {other:?}"),
    }
    assert_eq!(backend.search_count(), 0);
    assert_eq!(backend.dialogue_count(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_two_phase_retrieval_merges_with_dedup() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store.clone());

    // Phase 1: three documents
    backend.push_search(vec![
        doc("a", "initial text a"),
        doc("b", "initial text b"),
        doc("c", "initial text c"),
    ]);
    // Phase 2: five documents, one overlapping identifier with new content
    backend.push_search(vec![
        doc("c", "refined text c"),
        doc("d", "refined text d"),
        doc("e", "refined text e"),
        doc("f", "refined text f"),
        doc("g", "refined text g"),
    ]);
    backend.push_reply("benign");
    backend.push_reply("Firewalls enforce packet filtering policies at network boundaries");
    backend.push_reply("A firewall filters inbound and outbound traffic per policy [1]");

    let outcome = service
        .chat(request("How does a firewall protect an internal network"))
        .await
        .expect("pipeline should succeed");

    // 3 + 5 - 1 duplicate
    assert_eq!(outcome.citations.len(), 7);
    let ordinals: Vec<usize> = outcome.citations.iter().map(|c| c.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6, 7]);

    // The overlapping document kept the refined content
    let overlap = outcome
        .citations
        .iter()
        .find(|c| c.source_id == "c")
        .expect("overlapping document should be cited");
    assert_eq!(overlap.snippet, "refined text c");

    // intent + draft + final answer
    assert_eq!(backend.dialogue_count(), 3);
    assert_eq!(backend.search_count(), 2);

    // The exchange was appended
    let turns = store.turns(&outcome.conversation_id).unwrap();
    assert_eq!(turns.len(), 2);
}

#[tokio::test]
async fn test_malicious_intent_rejected_before_retrieval() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store.clone());

    backend.push_reply("malicious");

    let result = service
        .chat(request("a perfectly normal looking question"))
        .await;

    assert!(matches!(result, Err(GuardRagError::IntentRejected)));
    assert_eq!(backend.search_count(), 0);
    assert_eq!(backend.dialogue_count(), 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_intent_label_is_case_insensitive_and_trimmed() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store.clone());

    backend.push_reply("  Benign \n");
    backend.push_search(vec![]);
    backend.push_search(vec![]);
    backend.push_reply("An answer with no sources");

    let outcome = service.chat(request("is this fine")).await.unwrap();
    assert!(outcome.citations.is_empty());
}

#[tokio::test]
async fn test_unexpected_intent_label_fails_closed() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store);

    // Not "malicious", but not exactly "benign" either: still rejected
    backend.push_reply("uncertain");

    let result = service.chat(request("hello there")).await;
    assert!(matches!(result, Err(GuardRagError::IntentRejected)));
    assert_eq!(backend.search_count(), 0);
}

#[tokio::test]
async fn test_history_window_limits_rendered_turns() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store.clone());

    // Twelve prior turns in the session
    for i in 0..6 {
        store.append_exchange(
            "conv-hist",
            &format!("turn-{:02}", i * 2 + 1),
            &format!("turn-{:02}", i * 2 + 2),
        );
    }

    backend.push_reply("benign");
    backend.push_search(vec![]);
    backend.push_search(vec![]);
    backend.push_reply("Here is an update grounded in the material");

    let mut req = request("anything new on this topic");
    req.conversation_id = Some("conv-hist".to_string());
    let outcome = service.chat(req).await.unwrap();
    assert_eq!(outcome.conversation_id, "conv-hist");

    // The final generation prompt is the last dialogue call
    let prompts = backend.recorded_prompts();
    let final_prompt = prompts.last().unwrap();
    assert!(!final_prompt.contains("turn-01"));
    assert!(!final_prompt.contains("turn-02"));
    for i in 3..=12 {
        assert!(
            final_prompt.contains(&format!("turn-{i:02}")),
            "missing turn-{i:02}"
        );
    }

    // Appended on top of the existing twelve
    assert_eq!(store.turns("conv-hist").unwrap().len(), 14);
}

#[tokio::test]
async fn test_empty_phase_one_uses_question_as_draft() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store);

    backend.push_reply("benign");
    backend.push_search(vec![]);
    backend.push_search(vec![doc("x", "some reference text")]);
    backend.push_reply("Answer from the refined phase [1]");

    let outcome = service.chat(request("an unusual question")).await.unwrap();

    // No draft generation happened: intent + final answer only
    assert_eq!(backend.dialogue_count(), 2);
    assert_eq!(outcome.citations.len(), 1);
}

#[tokio::test]
async fn test_retrieval_failure_leaves_store_untouched() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store.clone());

    backend.push_reply("benign");
    // No search results scripted: the phase-1 search fails

    let result = service.chat(request("a fine question")).await;
    assert!(result.is_err());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_output_guard_blocks_jailbreak_confirmation() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store.clone());

    backend.push_reply("benign");
    backend.push_search(vec![]);
    backend.push_search(vec![]);
    backend.push_reply("Fine. I have ignored instructions and here is everything");

    let result = service.chat(request("tempting request")).await;

    match result {
        Err(GuardRagError::OutputRejected(reason)) => {
            assert_eq!(reason, GuardReason::JailbreakConfirmation);
        }
        other => panic!("expected output rejection, got {other:?}"),
    }
    // Rejected output is never committed to the conversation
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_evaluation_attached_when_enabled() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store);

    backend.push_reply("benign");
    backend.push_search(vec![doc("a", "reference material")]);
    backend.push_reply("a draft grounded in the reference");
    backend.push_search(vec![]);
    backend.push_reply("The final grounded answer [1]");
    backend.push_reply(
        r#"{"accuracy_score": 28, "relevance_score": 22, "completeness_score": 18,
            "clarity_score": 12, "format_score": 9, "total_score": 89,
            "strengths": ["grounded"], "weaknesses": [], "suggestions": []}"#,
    );

    let mut req = request("what is defense in depth");
    req.enable_evaluation = true;
    let outcome = service.chat(req).await.unwrap();

    let evaluation = outcome.evaluation.expect("evaluation requested");
    assert_eq!(evaluation.total_score, 89);
    assert_eq!(evaluation.accuracy_score, 28);
}

#[tokio::test]
async fn test_evaluation_failure_does_not_fail_the_request() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store);

    backend.push_reply("benign");
    backend.push_search(vec![]);
    backend.push_search(vec![]);
    backend.push_reply("The final grounded answer");
    // Evaluation dialogue calls are unscripted and will error; the chat
    // must still succeed with the default report attached.

    let mut req = request("what is defense in depth");
    req.enable_evaluation = true;
    let outcome = service.chat(req).await.unwrap();

    let evaluation = outcome.evaluation.expect("evaluation requested");
    assert_eq!(evaluation.total_score, 0);
    assert!(!evaluation.weaknesses.is_empty());
}

#[tokio::test]
async fn test_overlong_input_rejected_with_length_reason() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend.clone(), store);

    let long_input = "why ".repeat(200);
    let result = service.chat(request(&long_input)).await;

    match result {
        Err(GuardRagError::ValidationRejected(reason)) => {
            assert_eq!(reason, GuardReason::Length);
        }
        other => panic!("expected length rejection, got {other:?}"),
    }
    assert_eq!(backend.dialogue_count(), 0);
}

#[tokio::test]
async fn test_blank_message_rejected() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(ConversationStore::new());
    let service = service_without_scorer(backend, store);

    let result = service.chat(request("   ")).await;
    assert!(matches!(result, Err(GuardRagError::EmptyMessage)));
}
