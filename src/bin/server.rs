//! PDF chat server binary
//!
//! Run with: cargo run --bin pdf-chat-server

use pdf_chat::{config::AppConfig, server::ChatServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_chat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                      PDF Chat Server                      ║
║        Document Q&A with Page-Cited Answers               ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Config file is optional; env vars override either way
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(&path)?,
        None => AppConfig::from_env(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embedding.model);
    tracing::info!("  - Embedding dimensions: {}", config.embedding.dimensions);
    tracing::info!("  - Completion models: {}", config.llm.models.join(", "));
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    if config.llm.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set; chat requests will fail until it is provided");
    }

    tracing::info!("Checking Ollama at {}...", config.embedding.base_url);
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.embedding.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.embedding.base_url);
            tracing::warn!("Uploads need a running Ollama with the embedding model:");
            tracing::warn!("  1. Start: ollama serve");
            tracing::warn!("  2. Pull model: ollama pull {}", config.embedding.model);
        }
    }

    let server = ChatServer::new(config);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/api/health", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/upload - Upload a PDF");
    println!("  POST   /api/chat   - Ask questions (SSE stream)");
    println!("  GET    /api/stats  - Index statistics");
    println!("  DELETE /api/reset  - Clear the knowledge base");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
