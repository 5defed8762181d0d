//! pdf-chat: PDF question answering with hybrid retrieval and page citations
//!
//! Upload PDFs, ask questions over them, and get streamed answers grounded
//! in the document text with `(Page N)` citations. Retrieval fuses dense
//! vector similarity with BM25 keyword matching via reciprocal rank fusion.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::{
    chat::{ChatEvent, ChatRequest},
    document::{Chunk, Document},
    response::UploadResponse,
};
