//! In-memory BM25 keyword index

use std::collections::HashMap;

use regex::Regex;

use crate::types::document::Chunk;

/// A scored match from the keyword index
#[derive(Debug, Clone)]
pub struct KeywordMatch {
    pub chunk: Chunk,
    /// BM25 score, always >= 0
    pub score: f32,
}

#[derive(Debug)]
struct DocEntry {
    chunk: Chunk,
    /// Term frequency per token
    term_freq: HashMap<String, u32>,
    /// Token count of the chunk
    len: usize,
}

/// BM25 index over chunk text.
///
/// Documents are keyed by chunk ID; upserting an existing ID removes the
/// old posting first so document frequencies stay consistent. The IDF
/// uses the non-negative `ln(1 + (N - df + 0.5) / (df + 0.5))` form, so
/// very common terms contribute nothing rather than a negative score.
pub struct KeywordIndex {
    k1: f32,
    b: f32,
    docs: HashMap<String, DocEntry>,
    doc_freq: HashMap<String, usize>,
    total_tokens: usize,
    token_re: Regex,
}

impl KeywordIndex {
    pub fn new(k1: f32, b: f32) -> Self {
        Self {
            k1,
            b,
            docs: HashMap::new(),
            doc_freq: HashMap::new(),
            total_tokens: 0,
            token_re: Regex::new(r"\w+").expect("Invalid regex"),
        }
    }

    /// Lowercase word tokens of length >= 2
    fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.token_re
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .filter(|t| t.len() >= 2)
            .collect()
    }

    /// Insert or replace a chunk
    pub fn upsert(&mut self, chunk: Chunk) {
        self.remove_one(&chunk.id);

        let tokens = self.tokenize(&chunk.content);
        let len = tokens.len();
        let mut term_freq: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *term_freq.entry(token).or_insert(0) += 1;
        }
        for term in term_freq.keys() {
            *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
        }
        self.total_tokens += len;
        self.docs.insert(
            chunk.id.clone(),
            DocEntry {
                chunk,
                term_freq,
                len,
            },
        );
    }

    fn remove_one(&mut self, chunk_id: &str) {
        if let Some(old) = self.docs.remove(chunk_id) {
            for term in old.term_freq.keys() {
                if let Some(df) = self.doc_freq.get_mut(term) {
                    *df = df.saturating_sub(1);
                    if *df == 0 {
                        self.doc_freq.remove(term);
                    }
                }
            }
            self.total_tokens = self.total_tokens.saturating_sub(old.len);
        }
    }

    /// Drop all postings belonging to the given chunk IDs
    pub fn remove(&mut self, chunk_ids: &[String]) {
        for id in chunk_ids {
            self.remove_one(id);
        }
    }

    pub fn clear(&mut self) {
        self.docs.clear();
        self.doc_freq.clear();
        self.total_tokens = 0;
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of distinct terms in the index
    pub fn term_count(&self) -> usize {
        self.doc_freq.len()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.docs.len() as f32;
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f32;
        if df == 0.0 {
            return 0.0;
        }
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Top-`k` chunks by BM25 score, descending; chunks matching no query
    /// term are never returned
    pub fn search(&self, query: &str, k: usize) -> Vec<KeywordMatch> {
        if self.docs.is_empty() || k == 0 {
            return Vec::new();
        }
        let terms = self.tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let avg_len = self.total_tokens as f32 / self.docs.len() as f32;
        let mut matches: Vec<KeywordMatch> = self
            .docs
            .values()
            .filter_map(|doc| {
                let mut score = 0.0f32;
                for term in &terms {
                    let tf = doc.term_freq.get(term).copied().unwrap_or(0) as f32;
                    if tf == 0.0 {
                        continue;
                    }
                    let norm = self.k1 * (1.0 - self.b + self.b * doc.len as f32 / avg_len.max(1.0));
                    score += self.idf(term) * tf * (self.k1 + 1.0) / (tf + norm);
                }
                (score > 0.0).then(|| KeywordMatch {
                    chunk: doc.chunk.clone(),
                    score,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        matches.truncate(k);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: content.to_string(),
            page_number: 1,
            chunk_index: 0,
            filename: "test.pdf".to_string(),
            category: Default::default(),
        }
    }

    fn sample_index() -> KeywordIndex {
        let mut index = KeywordIndex::new(1.5, 0.75);
        index.upsert(chunk("a", "The operating voltage range is 9 to 30 volts"));
        index.upsert(chunk("b", "Install the antenna on the roof for best signal"));
        index.upsert(chunk("c", "Battery voltage is monitored every minute"));
        index
    }

    #[test]
    fn matches_rank_term_frequency() {
        let index = sample_index();
        let results = index.search("voltage range", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "a");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn no_matching_terms_yields_empty() {
        let index = sample_index();
        assert!(index.search("zebra quantum", 10).is_empty());
        assert!(index.search("", 10).is_empty());
    }

    #[test]
    fn single_char_tokens_are_ignored() {
        let index = sample_index();
        assert!(index.search("a b c", 10).is_empty());
    }

    #[test]
    fn scores_are_non_negative_for_ubiquitous_terms() {
        let mut index = KeywordIndex::new(1.5, 0.75);
        index.upsert(chunk("a", "common word here"));
        index.upsert(chunk("b", "common word there"));
        index.upsert(chunk("c", "common word everywhere"));
        for m in index.search("common", 10) {
            assert!(m.score >= 0.0);
        }
    }

    #[test]
    fn upsert_replaces_posting() {
        let mut index = sample_index();
        index.upsert(chunk("a", "completely different content about firmware"));
        assert_eq!(index.len(), 3);
        assert!(index.search("firmware", 10).iter().any(|m| m.chunk.id == "a"));
        assert!(!index.search("volts", 10).iter().any(|m| m.chunk.id == "a"));
    }

    #[test]
    fn remove_updates_frequencies() {
        let mut index = sample_index();
        index.remove(&["a".to_string(), "c".to_string()]);
        assert_eq!(index.len(), 1);
        assert!(index.search("voltage", 10).is_empty());
    }

    #[test]
    fn empty_index_returns_empty() {
        let index = KeywordIndex::new(1.5, 0.75);
        assert!(index.search("anything", 5).is_empty());
    }
}
