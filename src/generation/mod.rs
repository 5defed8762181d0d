//! Answer generation: prompt assembly and citation extraction

pub mod citation;
pub mod prompt;

pub use citation::extract_page_citations;
pub use prompt::{PromptBuilder, NO_CONTEXT_MESSAGE, SYSTEM_PROMPT};
