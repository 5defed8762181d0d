//! In-memory dense vector index with cosine similarity search

use crate::error::{Error, Result};
use crate::types::document::Chunk;
use crate::types::response::VectorStoreStats;

/// A stored chunk embedding
#[derive(Debug, Clone)]
struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
    norm: f32,
}

/// A scored match from the vector index
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Brute-force cosine index.
///
/// Upserts are keyed by chunk ID, so re-ingesting a document replaces its
/// vectors instead of duplicating them. Search is exact; at the corpus
/// sizes this service handles, a linear scan is faster than maintaining an
/// approximate structure.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<Entry>,
    dimensions: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a chunk's embedding.
    ///
    /// The first insert fixes the index dimensionality; later inserts with
    /// a different dimension are rejected.
    pub fn upsert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::index("Embedding must not be empty"));
        }
        match self.dimensions {
            None => self.dimensions = Some(embedding.len()),
            Some(dims) if dims != embedding.len() => {
                return Err(Error::index(format!(
                    "Embedding dimension mismatch: index has {}, got {}",
                    dims,
                    embedding.len()
                )));
            }
            Some(_) => {}
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        let entry = Entry {
            chunk,
            embedding,
            norm,
        };

        match self.entries.iter_mut().find(|e| e.chunk.id == entry.chunk.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Top-`k` chunks by cosine similarity, descending; ties break on
    /// chunk ID so results are stable across runs
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorMatch>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let dims = self.dimensions.unwrap_or(0);
        if query.len() != dims {
            return Err(Error::index(format!(
                "Query dimension mismatch: index has {}, got {}",
                dims,
                query.len()
            )));
        }

        let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        if query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let mut matches: Vec<VectorMatch> = self
            .entries
            .iter()
            .filter(|e| e.norm > 0.0)
            .map(|e| {
                let dot: f32 = e
                    .embedding
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| a * b)
                    .sum();
                VectorMatch {
                    chunk: e.chunk.clone(),
                    score: dot / (e.norm * query_norm),
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        matches.truncate(k);
        Ok(matches)
    }

    /// Drop all vectors belonging to the given chunk IDs
    pub fn remove(&mut self, chunk_ids: &[String]) {
        self.entries.retain(|e| !chunk_ids.contains(&e.chunk.id));
        if self.entries.is_empty() {
            self.dimensions = None;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dimensions = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> VectorStoreStats {
        VectorStoreStats {
            vector_count: self.entries.len(),
            dimensions: self.dimensions,
        }
    }
}
