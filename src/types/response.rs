//! HTTP response types

use serde::{Deserialize, Serialize};

/// Response from a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Outcome marker (`"success"`); failures return a structured error
    /// response instead of fabricated counts
    pub status: String,
    /// Uploaded filename
    pub filename: String,
    /// Number of pages in the document
    pub page_count: u32,
    /// Number of chunks indexed
    pub chunk_count: u32,
    /// Processing time in seconds
    pub processing_time: f64,
}

/// Statistics about the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreStats {
    /// Number of vectors stored
    pub vector_count: usize,
    /// Embedding dimensions (None while the index is empty)
    pub dimensions: Option<usize>,
}

/// Statistics about the hybrid search layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of chunks in the keyword index
    pub indexed_documents: usize,
    /// Number of distinct terms in the keyword index
    pub term_count: usize,
    /// Dense-modality weight
    pub alpha: f32,
    /// Reciprocal-rank-fusion constant
    pub rrf_k: u32,
    /// Vector index statistics
    pub vector_store_stats: VectorStoreStats,
}

/// Response from GET /api/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of uploaded documents
    pub document_count: usize,
    /// Total chunks across both indices
    pub total_chunks: usize,
    /// Vector index statistics
    pub vector_store_stats: VectorStoreStats,
    /// Hybrid search statistics
    pub search_stats: SearchStats,
}

/// Health of the LLM provider, with a reason when unhealthy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmHealth {
    pub healthy: bool,
    pub reason: String,
}

/// Per-component health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub vector_store: bool,
    pub embedder: bool,
    pub groq_client: LlmHealth,
}

/// Response from GET /api/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    pub components: ComponentHealth,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Response from DELETE /api/reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
}
