//! Hybrid retrieval over the search indices

pub mod hybrid;

pub use hybrid::{HybridRanker, SearchResult};
