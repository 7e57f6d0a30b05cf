//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::rag::ChatService;
use crate::retrieval::VectorServiceClient;
use crate::Result;

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("Starting guardrag API server...");

    // Initialize services
    let backend = Arc::new(VectorServiceClient::new(&config.vector)?);
    let store = Arc::new(ConversationStore::new());
    let chat_service = Arc::new(ChatService::new(backend, store.clone(), config));

    let state = AppState {
        chat_service,
        store,
    };

    let api_router = routes::api_routes(state);

    let mut app = Router::new().nest("/api", api_router).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new()),
    );

    // Add CORS if enabled
    if enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health       - Health check");
    info!("  POST /api/chat         - Guarded RAG chat");
    info!("  GET  /api/history      - List conversations");
    info!("  GET  /api/history/:id  - Conversation turns");
    info!("  POST /api/clear        - Reset conversation store");

    axum::serve(listener, app).await?;

    Ok(())
}
