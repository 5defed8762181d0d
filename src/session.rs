//! In-memory chat session store

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::chat::{ChatMessage, Role, Session};

/// Process-lifetime session store keyed by session ID.
///
/// Sessions exist only to give the model conversation history and to
/// support transcript export; nothing is persisted across restarts.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a client-supplied session ID, creating a fresh session when
    /// the ID is absent or unknown. Returns the effective session ID.
    pub fn resolve(&self, session_id: Option<&str>) -> String {
        match session_id {
            Some(id) if self.sessions.contains_key(id) => id.to_string(),
            _ => {
                let id = Uuid::new_v4().to_string();
                self.sessions.insert(id.clone(), Session::new());
                id
            }
        }
    }

    /// Append a message to a session, creating the session if needed
    pub fn append(&self, session_id: &str, role: Role, content: impl Into<String>) {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .messages
            .push(ChatMessage::new(role, content));
    }

    /// Conversation history for a session, oldest first; empty when the
    /// session is unknown
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .get(session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Render a session transcript as markdown
    pub fn export_markdown(&self, session_id: &str) -> Result<String> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        let mut out = String::new();
        out.push_str("# Chat Transcript\n\n");
        out.push_str(&format!(
            "Session started: {}\n\n",
            session.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
        for msg in &session.messages {
            let speaker = match msg.role {
                Role::User => "**You**",
                Role::Assistant => "**Assistant**",
            };
            out.push_str(&format!(
                "{} ({}):\n\n{}\n\n---\n\n",
                speaker,
                msg.timestamp.format("%H:%M:%S"),
                msg.content
            ));
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove one session; false when the ID is unknown
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_creates_and_reuses_sessions() {
        let store = SessionStore::new();
        let id = store.resolve(None);
        assert_eq!(store.resolve(Some(&id)), id);
        // Unknown IDs get a fresh session rather than trusting the client
        let other = store.resolve(Some("not-a-session"));
        assert_ne!(other, "not-a-session");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn history_preserves_order() {
        let store = SessionStore::new();
        let id = store.resolve(None);
        store.append(&id, Role::User, "question");
        store.append(&id, Role::Assistant, "answer");
        let history = store.history(&id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "question");
        assert_eq!(history[1].content, "answer");
    }

    #[test]
    fn export_renders_both_speakers() {
        let store = SessionStore::new();
        let id = store.resolve(None);
        store.append(&id, Role::User, "What is the range?");
        store.append(&id, Role::Assistant, "9-30V (Page 2)");
        let md = store.export_markdown(&id).unwrap();
        assert!(md.contains("# Chat Transcript"));
        assert!(md.contains("**You**"));
        assert!(md.contains("**Assistant**"));
        assert!(md.contains("(Page 2)"));
    }

    #[test]
    fn export_of_unknown_session_fails() {
        let store = SessionStore::new();
        assert!(store.export_markdown("missing").is_err());
    }
}
