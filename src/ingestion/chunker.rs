//! Page-aware semantic chunking
//!
//! Pages are chunked independently so every chunk carries an exact page
//! anchor for citations; text is never merged across a page boundary.

use crate::config::ChunkingConfig;
use crate::ingestion::parser::PdfContent;
use crate::types::document::{Chunk, ChunkCategory};

/// Separator cascade, tried in order from coarsest to finest
const SEPARATORS: &[&str] = &["\n\n\n", "\n\n", "\n", ". ", "! ", "? ", ", ", " "];

/// How many hex characters of the content hash go into chunk IDs
const ID_PREFIX_LEN: usize = 12;

/// Splits page text into overlapping chunks with deterministic IDs
pub struct SemanticChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
}

impl SemanticChunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            chunk_size,
            // Overlap must leave room for new content in each chunk
            chunk_overlap: config.chunk_overlap.min(chunk_size / 2),
            min_chunk_size: config.min_chunk_size,
        }
    }

    /// Chunk a parsed document.
    ///
    /// Chunk IDs are derived from the document's content hash plus the page
    /// and position, so re-ingesting identical bytes yields identical IDs.
    pub fn chunk_document(&self, content: &PdfContent, filename: &str) -> Vec<Chunk> {
        let prefix = &content.content_hash[..ID_PREFIX_LEN.min(content.content_hash.len())];
        let mut chunks = Vec::new();

        for page in &content.pages {
            let text = page.text.trim();
            if text.is_empty() {
                continue;
            }
            for (idx, piece) in self.split_page(text).into_iter().enumerate() {
                let category = classify(&piece);
                chunks.push(Chunk {
                    id: Chunk::make_id(prefix, page.page_number, idx as u32),
                    content: piece,
                    page_number: page.page_number,
                    chunk_index: idx as u32,
                    filename: filename.to_string(),
                    category,
                });
            }
        }

        chunks
    }

    /// Body budget for the merge step; the overlap prefix added afterwards
    /// fills the remainder of `chunk_size`
    fn body_budget(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Split one page's text, apply overlap, drop fragments below the minimum
    fn split_page(&self, text: &str) -> Vec<String> {
        // A page that fits in one chunk needs no overlap headroom
        if text.len() <= self.chunk_size {
            let trimmed = text.trim();
            return if trimmed.len() >= self.min_chunk_size {
                vec![trimmed.to_string()]
            } else {
                Vec::new()
            };
        }
        let raw = self.split_recursive(text, SEPARATORS);
        self.apply_overlap(raw)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| c.len() >= self.min_chunk_size)
            .collect()
    }

    /// Recursive split: try each separator in order, merging the resulting
    /// pieces greedily up to the target size; pieces that are still too
    /// large recurse with the finer separators
    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if text.len() <= self.body_budget() {
            return vec![text.to_string()];
        }

        let mut rest = separators;
        while let Some((&sep, tail)) = rest.split_first() {
            rest = tail;
            if text.contains(sep) {
                let pieces = split_keep(text, sep);
                return self.merge_pieces(pieces, rest);
            }
        }

        self.split_chars(text)
    }

    /// Greedily pack pieces into chunks no larger than the body budget
    fn merge_pieces(&self, pieces: Vec<String>, finer: &[&str]) -> Vec<String> {
        let budget = self.body_budget();
        let mut out = Vec::new();
        let mut current = String::new();

        for piece in pieces {
            if piece.len() > budget {
                if !current.trim().is_empty() {
                    out.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                out.extend(self.split_recursive(&piece, finer));
                continue;
            }
            if !current.is_empty() && current.len() + piece.len() > budget {
                if !current.trim().is_empty() {
                    out.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            current.push_str(&piece);
        }
        if !current.trim().is_empty() {
            out.push(current);
        }

        out
    }

    /// Last resort for separator-free text: fixed windows on char boundaries
    fn split_chars(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut start = 0;
        while start < text.len() {
            let mut end = (start + self.body_budget()).min(text.len());
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            out.push(text[start..end].to_string());
            start = end;
        }
        out
    }

    /// Prefix each chunk after the first with the tail of its predecessor.
    ///
    /// Bodies were merged to `chunk_size - chunk_overlap`, and the tail is
    /// capped one below the overlap to leave room for the joining space,
    /// so the result never exceeds `chunk_size` characters.
    fn apply_overlap(&self, chunks: Vec<String>) -> Vec<String> {
        if self.chunk_overlap == 0 || chunks.len() < 2 {
            return chunks;
        }
        let tail_budget = self.chunk_overlap - 1;
        let mut out = Vec::with_capacity(chunks.len());
        let mut prev_tail: Option<String> = None;
        for chunk in chunks {
            let merged = match prev_tail.take() {
                Some(tail) if !tail.is_empty() => format!("{} {}", tail, chunk),
                _ => chunk.clone(),
            };
            prev_tail = Some(overlap_tail(&chunk, tail_budget));
            out.push(merged);
        }
        out
    }
}

/// Split keeping the separator attached to the preceding piece
fn split_keep(text: &str, sep: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(sep) {
        let end = pos + sep.len();
        parts.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}

/// Last `max_len` bytes of a chunk, snapped to a char boundary and then
/// forward to a word boundary so the overlap never starts mid-word
fn overlap_tail(chunk: &str, max_len: usize) -> String {
    if chunk.len() <= max_len {
        return chunk.to_string();
    }
    let mut start = chunk.len() - max_len;
    while !chunk.is_char_boundary(start) {
        start += 1;
    }
    let tail = &chunk[start..];
    match tail.find(char::is_whitespace) {
        Some(ws) => tail[ws..].trim_start().to_string(),
        None => tail.to_string(),
    }
}

/// Pick the best-scoring keyword category, defaulting to General
fn classify(text: &str) -> ChunkCategory {
    let lower = text.to_lowercase();
    let mut best = ChunkCategory::General;
    let mut best_score = 0usize;
    for (category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords.iter().filter(|k| lower.contains(*k)).count();
        if score > best_score {
            best_score = score;
            best = *category;
        }
    }
    best
}

const CATEGORY_KEYWORDS: &[(ChunkCategory, &[&str])] = &[
    (
        ChunkCategory::Hardware,
        &[
            "voltage", "current", "watt", "amp", "ohm", "resistance", "circuit", "board", "chip",
            "processor", "memory", "storage", "sensor", "actuator", "motor", "connector", "cable",
            "pin", "gpio", "uart", "spi", "i2c", "pcb", "solder", "wiring",
        ],
    ),
    (
        ChunkCategory::Communication,
        &[
            "gps", "wifi", "bluetooth", "lora", "radio", "antenna", "signal", "transmission",
            "reception", "protocol", "network", "ethernet", "tcp", "udp", "http", "mqtt",
            "modbus", "rs485", "serial",
        ],
    ),
    (
        ChunkCategory::Power,
        &[
            "battery", "solar", "charging", "consumption", "efficiency", "regulator", "converter",
            "inverter", "ups", "backup", "supply", "power",
        ],
    ),
    (
        ChunkCategory::Software,
        &[
            "firmware", "algorithm", "code", "programming", "software", "application", "driver",
            "library", "api", "function", "variable", "class", "method", "debug", "compile",
        ],
    ),
    (
        ChunkCategory::Commands,
        &[
            "command", "instruction", "syntax", "parameter", "argument", "option", "flag",
            "execute", "restart", "configure", "setup", "install", "update", "upgrade",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::parser::PageText;

    fn chunker(size: usize, overlap: usize, min: usize) -> SemanticChunker {
        SemanticChunker::new(&ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            min_chunk_size: min,
        })
    }

    fn content(pages: &[(u32, &str)]) -> PdfContent {
        let pages: Vec<PageText> = pages
            .iter()
            .map(|(n, t)| PageText {
                page_number: *n,
                text: t.to_string(),
            })
            .collect();
        let total = pages.len() as u32;
        PdfContent {
            pages,
            total_pages: total,
            content_hash: "abcdef0123456789".to_string(),
        }
    }

    #[test]
    fn short_page_yields_single_chunk() {
        let c = chunker(800, 150, 10);
        let chunks = c.chunk_document(&content(&[(1, "The operating voltage is 3.3V.")]), "m.pdf");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page_number, 1);
        assert_eq!(chunks[0].id, "abcdef012345_p1_c0");
    }

    #[test]
    fn chunks_respect_size_bound() {
        let paragraph = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let c = chunker(200, 50, 10);
        let chunks = c.chunk_document(&content(&[(1, &paragraph)]), "m.pdf");
        assert!(chunks.len() > 1);
        // The bound includes the overlap prefix
        for chunk in &chunks {
            assert!(chunk.content.len() <= 200, "len={}", chunk.content.len());
        }
    }

    #[test]
    fn default_config_stays_within_configured_maximum() {
        let page = "The power regulator accepts a supply between nine and thirty volts. "
            .repeat(60);
        let c = SemanticChunker::new(&ChunkingConfig::default());
        let chunks = c.chunk_document(&content(&[(1, &page)]), "m.pdf");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.content.len() <= 800,
                "chunk exceeds configured maximum: {} > 800",
                chunk.content.len()
            );
        }
    }

    #[test]
    fn consecutive_chunks_share_overlap() {
        let paragraph = "alpha bravo charlie delta echo foxtrot golf hotel india juliett ".repeat(20);
        let c = chunker(200, 60, 10);
        let chunks = c.chunk_document(&content(&[(1, &paragraph)]), "m.pdf");
        assert!(chunks.len() > 1);
        // Second chunk starts with text that also appears near the end of the first
        let head: String = chunks[1].content.chars().take(20).collect();
        assert!(chunks[0].content.contains(head.trim()));
    }

    #[test]
    fn pages_are_never_merged() {
        let c = chunker(800, 150, 5);
        let chunks = c.chunk_document(
            &content(&[(1, "First page text here."), (2, "Second page text here.")]),
            "m.pdf",
        );
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page_number, 1);
        assert_eq!(chunks[1].page_number, 2);
        assert!(!chunks[0].content.contains("Second"));
    }

    #[test]
    fn empty_pages_produce_no_chunks() {
        let c = chunker(800, 150, 50);
        let chunks = c.chunk_document(&content(&[(1, ""), (2, "   \n  ")]), "m.pdf");
        assert!(chunks.is_empty());
    }

    #[test]
    fn tiny_fragments_are_dropped() {
        let c = chunker(800, 150, 50);
        let chunks = c.chunk_document(&content(&[(1, "too short")]), "m.pdf");
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Power supply accepts 9 to 30 volts DC. ".repeat(30);
        let c = chunker(200, 50, 10);
        let a = c.chunk_document(&content(&[(1, &text)]), "m.pdf");
        let b = c.chunk_document(&content(&[(1, &text)]), "m.pdf");
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.content, y.content);
        }
    }

    #[test]
    fn coverage_of_page_text() {
        let text = "Sentence number one about sensors. Sentence number two about radios. ".repeat(15);
        let c = chunker(200, 50, 10);
        let chunks = c.chunk_document(&content(&[(1, &text)]), "m.pdf");
        let combined: String = chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join(" ");
        for word in ["sensors", "radios", "Sentence"] {
            assert!(combined.contains(word));
        }
    }

    #[test]
    fn separator_free_text_splits_on_char_boundaries() {
        let text = "x".repeat(1000);
        let c = chunker(300, 0, 10);
        let chunks = c.chunk_document(&content(&[(1, &text)]), "m.pdf");
        assert!(chunks.len() >= 3);
        let total: usize = chunks.iter().map(|c| c.content.len()).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn classify_picks_dominant_category() {
        assert_eq!(
            classify("The gps antenna and lora radio share one connector."),
            ChunkCategory::Communication
        );
        assert_eq!(classify("Nothing notable in this text."), ChunkCategory::General);
    }
}
