//! HTTP API surface
//!
//! Routes, request/response types, and the server bootstrap. The handlers
//! forward into the chat pipeline and translate its error taxonomy into
//! HTTP statuses; no pipeline logic lives here.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use server::serve_api;
