//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Chat pipeline
        .route("/chat", post(handlers::chat))
        // Conversation history
        .route("/history", get(handlers::history_list))
        .route("/history/:id", get(handlers::history_detail))
        .route("/clear", post(handlers::clear))
        .with_state(state)
}
