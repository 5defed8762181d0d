//! External service providers: embeddings and chat completions

pub mod completion;
pub mod embedding;
pub mod groq;
pub mod ollama;

pub use completion::{ChatTurn, CompletionProvider, ModelFallback};
pub use embedding::EmbeddingProvider;
pub use groq::GroqClient;
pub use ollama::OllamaEmbedder;
