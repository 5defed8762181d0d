//! In-memory search indices

pub mod keyword;
pub mod vector;

pub use keyword::{KeywordIndex, KeywordMatch};
pub use vector::{VectorIndex, VectorMatch};

use crate::config::RetrievalConfig;

/// The dense and sparse indices, updated together under one write lock so
/// queries never observe a chunk in one index but not the other
pub struct SearchIndex {
    pub vector: VectorIndex,
    pub keyword: KeywordIndex,
}

impl SearchIndex {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            vector: VectorIndex::new(),
            keyword: KeywordIndex::new(config.bm25_k1, config.bm25_b),
        }
    }

    /// Insert or replace a chunk in both indices
    pub fn upsert(
        &mut self,
        chunk: crate::types::document::Chunk,
        embedding: Vec<f32>,
    ) -> crate::error::Result<()> {
        self.vector.upsert(chunk.clone(), embedding)?;
        self.keyword.upsert(chunk);
        Ok(())
    }

    /// Remove chunks from both indices
    pub fn remove(&mut self, chunk_ids: &[String]) {
        self.vector.remove(chunk_ids);
        self.keyword.remove(chunk_ids);
    }

    pub fn clear(&mut self) {
        self.vector.clear();
        self.keyword.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty() && self.keyword.is_empty()
    }
}
