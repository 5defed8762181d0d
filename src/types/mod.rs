//! Core types for the PDF chat service

pub mod chat;
pub mod document;
pub mod response;

pub use chat::{ChatEvent, ChatMessage, ChatRequest, Role, Session};
pub use document::{Chunk, ChunkCategory, Document};
pub use response::{
    ComponentHealth, HealthResponse, LlmHealth, ResetResponse, SearchStats, StatsResponse,
    UploadResponse, VectorStoreStats,
};
