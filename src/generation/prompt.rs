//! Prompt assembly for grounded question answering

use crate::providers::completion::ChatTurn;
use crate::retrieval::SearchResult;
use crate::types::chat::{ChatMessage, Role};

/// System prompt that pins answers to the retrieved context and asks for
/// `(Page N)` citations
pub const SYSTEM_PROMPT: &str = "You are a technical assistant specializing in device \
specifications and documentation. Your role is to help users understand technical documents \
by providing accurate, concise answers based solely on the provided context.\n\n\
Guidelines:\n\
- Answer ONLY using information from the provided context\n\
- If information is not available, state \"I cannot find this information in the provided document\"\n\
- Include page citations in the format (Page X) when referencing specific information\n\
- Be accurate and factual\n\
- Focus on technical specifications and procedures\n\
- Keep responses concise but complete";

/// Answer returned without calling the model when retrieval finds nothing
pub const NO_CONTEXT_MESSAGE: &str = "I cannot find this information in the provided document. \
Try rephrasing your question or check that the relevant document has been uploaded.";

/// How many prior conversation turns to replay into the prompt
const HISTORY_TURNS: usize = 6;

/// Builds the message list sent to the completion provider
pub struct PromptBuilder;

impl PromptBuilder {
    /// Format retrieved chunks as context, each prefixed with its page
    /// anchor so the model can cite it
    pub fn format_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| format!("(Page {}) {}", r.chunk.page_number, r.chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Assemble the full chat: system prompt, recent history, then the
    /// context-grounded question
    pub fn build_messages(
        question: &str,
        results: &[SearchResult],
        history: &[ChatMessage],
    ) -> Vec<ChatTurn> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatTurn::system(SYSTEM_PROMPT));

        let start = history.len().saturating_sub(HISTORY_TURNS);
        for msg in &history[start..] {
            messages.push(match msg.role {
                Role::User => ChatTurn::user(msg.content.clone()),
                Role::Assistant => ChatTurn::assistant(msg.content.clone()),
            });
        }

        let context = Self::format_context(results);
        messages.push(ChatTurn::user(format!(
            "Context from document:\n{}\n\nUser Question: {}\n\n\
             Based on the provided context, please answer the user's question. Remember to:\n\
             1. Use only information from the context\n\
             2. Include page citations like (Page X) when referencing specific information\n\
             3. State if information is not available\n\
             4. Be concise and accurate",
            context, question
        )));

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::Chunk;

    fn result(page: u32, content: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: format!("x_p{}_c0", page),
                content: content.to_string(),
                page_number: page,
                chunk_index: 0,
                filename: "m.pdf".to_string(),
                category: Default::default(),
            },
            score: 0.01,
            vector_score: None,
            keyword_score: None,
        }
    }

    #[test]
    fn context_carries_page_anchors() {
        let ctx = PromptBuilder::format_context(&[
            result(2, "Voltage range is 9-30V."),
            result(5, "Antenna mounts on the roof."),
        ]);
        assert!(ctx.contains("(Page 2) Voltage range"));
        assert!(ctx.contains("(Page 5) Antenna"));
        assert!(ctx.contains("\n\n"));
    }

    #[test]
    fn messages_start_with_system_and_end_with_question() {
        let messages = PromptBuilder::build_messages(
            "What is the voltage range?",
            &[result(2, "Voltage range is 9-30V.")],
            &[],
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("What is the voltage range?"));
        assert!(messages[1].content.contains("(Page 2)"));
    }

    #[test]
    fn history_is_replayed_most_recent_last() {
        let history = vec![
            ChatMessage::new(Role::User, "first question"),
            ChatMessage::new(Role::Assistant, "first answer"),
        ];
        let messages = PromptBuilder::build_messages("follow-up", &[], &history);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert!(messages[3].content.contains("follow-up"));
    }

    #[test]
    fn history_is_truncated_to_recent_turns() {
        let history: Vec<ChatMessage> = (0..20)
            .map(|i| ChatMessage::new(Role::User, format!("q{}", i)))
            .collect();
        let messages = PromptBuilder::build_messages("latest", &[], &history);
        // system + 6 history turns + question
        assert_eq!(messages.len(), 8);
        assert!(messages[1].content.contains("q14"));
    }
}
