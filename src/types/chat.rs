//! Chat request, streaming event, and session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
    /// Session to continue; a new session is created when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A single record in the chat SSE stream.
///
/// Serialized as `data: <json>\n\n` frames; a `done` record always
/// terminates a successful stream, and an `error` record is always followed
/// by a `done` record so every stream reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    /// An answer fragment
    Content { content: String },
    /// Terminal marker for a successful stream
    Done {
        #[serde(default)]
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        citations: Option<Vec<u32>>,
    },
    /// A mid-stream failure; the stream still terminates with `done`
    Error { content: String },
}

impl ChatEvent {
    /// Content fragment event
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content {
            content: text.into(),
        }
    }

    /// Terminal event carrying the session ID and any cited pages
    pub fn done(session_id: impl Into<String>, citations: Vec<u32>) -> Self {
        Self::Done {
            content: String::new(),
            session_id: Some(session_id.into()),
            citations: if citations.is_empty() {
                None
            } else {
                Some(citations)
            },
        }
    }

    /// Error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            content: message.into(),
        }
    }
}

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// An in-memory conversation; process-lifetime only, never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
