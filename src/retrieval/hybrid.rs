//! Hybrid retrieval: dense and sparse results fused with reciprocal rank
//! fusion (RRF)

use std::collections::HashMap;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::index::SearchIndex;
use crate::types::document::Chunk;

/// A fused retrieval result
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Fused RRF score
    pub score: f32,
    /// Cosine similarity, when the chunk appeared in the dense results
    pub vector_score: Option<f32>,
    /// BM25 score, when the chunk appeared in the sparse results
    pub keyword_score: Option<f32>,
}

#[derive(Debug)]
struct Candidate {
    chunk: Chunk,
    dense_rank: Option<usize>,
    sparse_rank: Option<usize>,
    vector_score: Option<f32>,
    keyword_score: Option<f32>,
}

/// Fuses vector and keyword rankings.
///
/// Fusion works on ranks, not raw scores, so the two signals never need
/// score normalization. Each candidate scores
/// `alpha / (rrf_k + dense_rank) + (1 - alpha) / (rrf_k + sparse_rank)`,
/// with an absent ranking contributing zero. Because RRF scores are small
/// (about `1 / rrf_k` at best), the configured threshold is tiny as well.
pub struct HybridRanker {
    config: RetrievalConfig,
}

impl HybridRanker {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run both searches and fuse the rankings.
    ///
    /// Both indices are over-fetched beyond `top_k` so a chunk ranked just
    /// outside one list can still win on the combined score. An empty index
    /// yields an empty result, never an error.
    pub fn search(
        &self,
        index: &SearchIndex,
        query: &str,
        query_embedding: &[f32],
    ) -> Result<Vec<SearchResult>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }
        let fetch = self.config.top_k * self.config.fetch_factor.max(1);

        let dense = index.vector.search(query_embedding, fetch)?;
        let sparse = index.keyword.search(query, fetch);

        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        for (rank, m) in dense.into_iter().enumerate() {
            candidates.insert(
                m.chunk.id.clone(),
                Candidate {
                    chunk: m.chunk,
                    dense_rank: Some(rank + 1),
                    sparse_rank: None,
                    vector_score: Some(m.score),
                    keyword_score: None,
                },
            );
        }
        for (rank, m) in sparse.into_iter().enumerate() {
            match candidates.get_mut(&m.chunk.id) {
                Some(c) => {
                    c.sparse_rank = Some(rank + 1);
                    c.keyword_score = Some(m.score);
                }
                None => {
                    candidates.insert(
                        m.chunk.id.clone(),
                        Candidate {
                            chunk: m.chunk,
                            dense_rank: None,
                            sparse_rank: Some(rank + 1),
                            vector_score: None,
                            keyword_score: Some(m.score),
                        },
                    );
                }
            }
        }

        let alpha = self.config.alpha;
        let rrf_k = self.config.rrf_k as f32;
        let mut fused: Vec<(Candidate, f32)> = candidates
            .into_values()
            .map(|c| {
                let dense_part = c
                    .dense_rank
                    .map(|r| 1.0 / (rrf_k + r as f32))
                    .unwrap_or(0.0);
                let sparse_part = c
                    .sparse_rank
                    .map(|r| 1.0 / (rrf_k + r as f32))
                    .unwrap_or(0.0);
                let score = alpha * dense_part + (1.0 - alpha) * sparse_part;
                (c, score)
            })
            .filter(|(_, score)| *score >= self.config.threshold)
            .collect();

        // Deterministic order: score desc, then dense rank, then chunk ID
        fused.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    a.dense_rank
                        .unwrap_or(usize::MAX)
                        .cmp(&b.dense_rank.unwrap_or(usize::MAX))
                })
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        fused.truncate(self.config.top_k);

        Ok(fused
            .into_iter()
            .map(|(c, score)| SearchResult {
                chunk: c.chunk,
                score,
                vector_score: c.vector_score,
                keyword_score: c.keyword_score,
            })
            .collect())
    }
}
