//! API request handlers
//!
//! Thin layer only: extract the request, forward into the pipeline, map the
//! error taxonomy onto HTTP statuses. Validation and intent rejections get
//! specific messages; everything else degrades to a generic one so internal
//! error detail never reaches the caller.

use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::types::ChatRequestBody;
use crate::api::types::ChatResponseBody;
use crate::api::types::ClearResponse;
use crate::api::types::ErrorBody;
use crate::api::types::HealthResponse;
use crate::api::types::MessagesResponse;
use crate::conversation::ConversationStore;
use crate::errors::GuardRagError;
use crate::models::ConversationSummary;
use crate::rag::ChatRequest;
use crate::rag::ChatService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub store: Arc<ConversationStore>,
}

type ErrorReply = (StatusCode, Json<ErrorBody>);

fn error_reply(status: StatusCode, message: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Map a pipeline error to its HTTP reply. Rejections carry specific,
/// actionable messages; internal failures share one generic message.
fn map_pipeline_error(err: &GuardRagError) -> ErrorReply {
    match err {
        GuardRagError::EmptyMessage => error_reply(
            StatusCode::BAD_REQUEST,
            "Message must not be empty and must be a string",
        ),
        GuardRagError::ValidationRejected(_) => error_reply(
            StatusCode::BAD_REQUEST,
            "Your input contains disallowed content or is too long; please revise it and try again",
        ),
        GuardRagError::PromptRejected(_) => error_reply(
            StatusCode::BAD_REQUEST,
            "The assembled prompt failed safety screening",
        ),
        GuardRagError::OutputRejected(_) => error_reply(
            StatusCode::BAD_REQUEST,
            "The generated answer failed safety screening",
        ),
        GuardRagError::IntentRejected => error_reply(
            StatusCode::FORBIDDEN,
            "Your request was flagged as potentially malicious and was not processed",
        ),
        GuardRagError::ConversationNotFound(_) => {
            error_reply(StatusCode::NOT_FOUND, "Conversation not found")
        }
        _ => error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Request processing failed"),
    }
}

/// Chat endpoint (POST /api/chat)
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequestBody>,
) -> Result<Json<ChatResponseBody>, ErrorReply> {
    let message = body
        .message
        .map(super::types::MessagePayload::into_text)
        .unwrap_or_default();
    info!("POST /api/chat ({} chars)", message.chars().count());

    let request = ChatRequest {
        message,
        conversation_id: body.conversation_id,
        enable_evaluation: body.enable_evaluation,
    };

    match state.chat_service.chat(request).await {
        Ok(outcome) => Ok(Json(ChatResponseBody {
            response: outcome.response,
            citations: outcome.citations,
            conversation_id: outcome.conversation_id,
            evaluation: outcome.evaluation,
        })),
        Err(e) => {
            if e.is_rejection() {
                info!("chat request rejected: {}", e);
            } else {
                // Log the detail here; the caller only sees the generic body
                error!("chat request failed: {}", e);
            }
            Err(map_pipeline_error(&e))
        }
    }
}

/// Conversation list (GET /api/history)
pub async fn history_list(State(state): State<AppState>) -> Json<Vec<ConversationSummary>> {
    Json(state.store.list_summaries())
}

/// Full turn list of one conversation (GET /api/history/:id)
pub async fn history_detail(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<MessagesResponse>, ErrorReply> {
    match state.store.turns(&conversation_id) {
        Some(messages) => Ok(Json(MessagesResponse { messages })),
        None => Err(map_pipeline_error(&GuardRagError::ConversationNotFound(
            conversation_id,
        ))),
    }
}

/// Reset the conversation store (POST /api/clear)
pub async fn clear(State(state): State<AppState>) -> Json<ClearResponse> {
    state.store.clear();
    info!("conversation store cleared");
    Json(ClearResponse {
        status: "success".to_string(),
        message: "All conversations cleared".to_string(),
    })
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
