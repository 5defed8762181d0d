//! Shared application state

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::index::SearchIndex;
use crate::ingestion::{PdfParser, SemanticChunker};
use crate::providers::{
    CompletionProvider, EmbeddingProvider, GroqClient, ModelFallback, OllamaEmbedder,
};
use crate::retrieval::{HybridRanker, SearchResult};
use crate::session::SessionStore;
use crate::types::document::Document;
use crate::types::response::{
    ComponentHealth, HealthResponse, ResetResponse, SearchStats, StatsResponse, UploadResponse,
};

/// Shared application state, cheap to clone
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    /// Both indices behind one lock so queries see them in step
    index: RwLock<SearchIndex>,
    /// Serializes ingestion; held across embedding so two uploads never
    /// interleave their index writes
    ingest_lock: Mutex<()>,
    /// Uploaded documents keyed by content hash
    documents: DashMap<String, Document>,
    /// Chunk IDs per content hash, for replacement on re-upload and reset
    chunk_ids: DashMap<String, Vec<String>>,
    sessions: SessionStore,
    embedder: Arc<dyn EmbeddingProvider>,
    completions: Arc<dyn CompletionProvider>,
    fallback: ModelFallback,
    ranker: HybridRanker,
    chunker: SemanticChunker,
}

impl AppState {
    /// Create state with the real providers (Ollama embeddings, Groq chat)
    pub fn new(config: AppConfig) -> Self {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embedding));
        let completions: Arc<dyn CompletionProvider> = Arc::new(GroqClient::new(&config.llm));
        Self::with_providers(config, embedder, completions)
    }

    /// Create state with injected providers; used by tests
    pub fn with_providers(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completions: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                index: RwLock::new(SearchIndex::new(&config.retrieval)),
                ingest_lock: Mutex::new(()),
                documents: DashMap::new(),
                chunk_ids: DashMap::new(),
                sessions: SessionStore::new(),
                embedder,
                completions,
                fallback: ModelFallback::new(config.llm.models.clone()),
                ranker: HybridRanker::new(config.retrieval.clone()),
                chunker: SemanticChunker::new(&config.chunking),
                config,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    pub fn completions(&self) -> &dyn CompletionProvider {
        self.inner.completions.as_ref()
    }

    pub fn fallback(&self) -> &ModelFallback {
        &self.inner.fallback
    }

    /// Parse, chunk, embed, and index one uploaded PDF.
    ///
    /// Re-uploading content already indexed (same hash) replaces the old
    /// chunks instead of duplicating them. Embeddings are generated without
    /// holding the index lock; the index update itself is a single write.
    pub async fn ingest_document(&self, filename: &str, data: &[u8]) -> Result<UploadResponse> {
        let started = Instant::now();

        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(Error::UnsupportedFileType(
                filename.rsplit('.').next().unwrap_or("unknown").to_string(),
            ));
        }
        if data.is_empty() {
            return Err(Error::InvalidUpload("Uploaded file is empty".to_string()));
        }

        let _guard = self.inner.ingest_lock.lock().await;

        let content = PdfParser::parse(filename, data)?;
        let chunks = self.inner.chunker.chunk_document(&content, filename);
        if chunks.is_empty() {
            return Err(Error::file_parse(
                filename,
                "Document produced no indexable text",
            ));
        }

        tracing::info!(
            "Parsed '{}': {} pages, {} chunks",
            filename,
            content.total_pages,
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.inner.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let new_ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
        {
            let mut index = self.inner.index.write();
            if let Some(old_ids) = self.inner.chunk_ids.get(&content.content_hash) {
                index.remove(old_ids.value());
            }
            for (chunk, embedding) in chunks.iter().cloned().zip(embeddings) {
                index.upsert(chunk, embedding)?;
            }
        }

        let mut document = Document::new(
            filename.to_string(),
            content.content_hash.clone(),
            data.len() as u64,
        );
        document.page_count = content.total_pages;
        document.chunk_count = chunks.len() as u32;

        self.inner
            .chunk_ids
            .insert(content.content_hash.clone(), new_ids);
        self.inner
            .documents
            .insert(content.content_hash.clone(), document);

        Ok(UploadResponse {
            status: "success".to_string(),
            filename: filename.to_string(),
            page_count: content.total_pages,
            chunk_count: chunks.len() as u32,
            processing_time: started.elapsed().as_secs_f64(),
        })
    }

    /// Embed the question and run hybrid retrieval.
    ///
    /// An empty index returns no results rather than an error; the chat
    /// layer turns that into a deterministic fallback answer.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        if self.inner.index.read().is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.inner.embedder.embed(question).await?;
        let index = self.inner.index.read();
        self.inner.ranker.search(&index, question, &embedding)
    }

    pub fn stats(&self) -> StatsResponse {
        let index = self.inner.index.read();
        let vector_stats = index.vector.stats();
        let retrieval = self.inner.ranker.config();
        StatsResponse {
            document_count: self.inner.documents.len(),
            total_chunks: index.keyword.len(),
            vector_store_stats: vector_stats.clone(),
            search_stats: SearchStats {
                indexed_documents: index.keyword.len(),
                term_count: index.keyword.term_count(),
                alpha: retrieval.alpha,
                rrf_k: retrieval.rrf_k,
                vector_store_stats: vector_stats,
            },
        }
    }

    /// Probe each component; the service reports healthy only when all are
    pub async fn health(&self) -> HealthResponse {
        let embedder_ok = self.inner.embedder.health_check().await.unwrap_or(false);
        let llm = self.inner.completions.health_check().await;
        let healthy = embedder_ok && llm.healthy;

        HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            components: ComponentHealth {
                vector_store: true,
                embedder: embedder_ok,
                groq_client: llm,
            },
            timestamp: chrono::Utc::now(),
        }
    }

    /// Drop all indexed content and sessions
    pub fn reset(&self) -> ResetResponse {
        self.inner.index.write().clear();
        self.inner.documents.clear();
        self.inner.chunk_ids.clear();
        self.inner.sessions.clear();
        tracing::info!("Knowledge base reset");
        ResetResponse {
            message: "Knowledge base cleared".to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        true
    }
}
