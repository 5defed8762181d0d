//! Configuration for the PDF chat service

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval (hybrid search) configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// LLM (Groq) configuration
    #[serde(default)]
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing sections
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file: {}", e)))?;
        config.apply_env();
        Ok(config)
    }

    /// Default config with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply environment variable overrides (secrets never live in the file)
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding server
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Batch size for embedding generation
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks on the same page, in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (smaller fragments are dropped)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
            min_chunk_size: 50,
        }
    }
}

/// Hybrid retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Final number of results to return
    pub top_k: usize,
    /// Over-fetch multiplier for each modality before fusion
    pub fetch_factor: usize,
    /// Weight of the dense (vector) modality in [0, 1]
    pub alpha: f32,
    /// Reciprocal-rank-fusion constant
    pub rrf_k: u32,
    /// Minimum combined score to keep a result.
    ///
    /// RRF scores are small (a rank-1 hit in both modalities scores about
    /// 1/61); an aggressive threshold silently empties result sets, so the
    /// default is deliberately tiny.
    pub threshold: f32,
    /// BM25 term-frequency saturation parameter
    pub bm25_k1: f32,
    /// BM25 length-normalization parameter
    pub bm25_b: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            fetch_factor: 2,
            alpha: 0.5,
            rrf_k: 60,
            threshold: 0.0005,
            bm25_k1: 1.5,
            bm25_b: 0.75,
        }
    }
}

/// LLM (Groq) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL (OpenAI-compatible)
    pub base_url: String,
    /// API key; normally supplied via GROQ_API_KEY
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Ordered list of models to try; the next is used when the current fails
    pub models: Vec<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens in a response
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            models: vec![
                "llama-3.3-70b-versatile".to_string(),
                "llama-3.1-8b-instant".to_string(),
            ],
            temperature: 0.2,
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 150);
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.rrf_k, 60);
        assert!((config.retrieval.alpha - 0.5).abs() < f32::EPSILON);
        assert!(config.retrieval.threshold < 0.001);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [retrieval]
            top_k = 4
            fetch_factor = 3
            alpha = 0.7
            rrf_k = 60
            threshold = 0.001
            bm25_k1 = 1.5
            bm25_b = 0.75
            "#,
        )
        .unwrap();
        assert_eq!(parsed.retrieval.top_k, 4);
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.chunking.chunk_size, 800);
    }
}
