//! API routes for the chat server

pub mod chat;
pub mod export;
pub mod stats;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload with a larger body limit for multipart PDFs
        .route(
            "/upload",
            post(upload::upload_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Streaming chat
        .route("/chat", post(chat::chat))
        // Observability and admin
        .route("/stats", get(stats::stats))
        .route("/health", get(stats::health))
        .route("/reset", delete(stats::reset))
        // Transcript export
        .route("/export", post(export::export_markdown))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "pdf-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "PDF question answering with hybrid retrieval and page citations",
        "endpoints": {
            "POST /api/upload": "Upload and index a PDF (multipart 'file' field)",
            "POST /api/chat": "Ask a question; answer streams as SSE",
            "GET /api/stats": "Index and retrieval statistics",
            "GET /api/health": "Per-component health report",
            "DELETE /api/reset": "Clear all indexed content and sessions",
            "POST /api/export": "Download a session transcript as markdown",
        }
    }))
}
