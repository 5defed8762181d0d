//! Document ingestion: PDF parsing and page-aware chunking

pub mod chunker;
pub mod parser;

pub use chunker::SemanticChunker;
pub use parser::{PageText, PdfContent, PdfParser};
