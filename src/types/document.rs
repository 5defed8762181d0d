//! Document and chunk types with page-anchored metadata for citations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semantic category of a chunk, assigned by keyword matching during
/// chunking and carried as retrieval metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkCategory {
    Hardware,
    Communication,
    Power,
    Software,
    Commands,
    General,
}

impl ChunkCategory {
    /// Display name used in stats and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hardware => "hardware",
            Self::Communication => "communication",
            Self::Power => "power",
            Self::Software => "software",
            Self::Commands => "commands",
            Self::General => "general",
        }
    }
}

impl Default for ChunkCategory {
    fn default() -> Self {
        Self::General
    }
}

/// A bounded passage of document text, the unit of indexing and retrieval.
///
/// Chunks are immutable after creation; both indices keep their own copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic chunk ID: `{doc_hash_prefix}_p{page}_c{index}`
    pub id: String,
    /// Passage text, never empty
    pub content: String,
    /// Page the chunk starts on (1-indexed)
    pub page_number: u32,
    /// Position of the chunk within its page
    pub chunk_index: u32,
    /// Original filename, used in citations
    pub filename: String,
    /// Semantic category used as retrieval metadata
    pub category: ChunkCategory,
}

impl Chunk {
    /// Build the deterministic chunk ID from the document hash prefix,
    /// page number, and per-page index
    pub fn make_id(doc_hash_prefix: &str, page_number: u32, chunk_index: u32) -> String {
        format!("{}_p{}_c{}", doc_hash_prefix, page_number, chunk_index)
    }
}

/// A document that has been uploaded and indexed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// SHA-256 of the extracted text, hex-encoded (used for deduplication
    /// and as the chunk ID prefix source)
    pub content_hash: String,
    /// Total number of pages
    pub page_count: u32,
    /// Total number of chunks created
    pub chunk_count: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(filename: String, content_hash: String, file_size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            content_hash,
            page_count: 0,
            chunk_count: 0,
            file_size,
            uploaded_at: chrono::Utc::now(),
        }
    }
}
