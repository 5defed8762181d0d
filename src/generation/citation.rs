//! Page citation extraction from generated answers

use regex::Regex;

/// Extract cited page numbers from an answer.
///
/// Matches the `(Page N)` format the system prompt asks for; pages are
/// deduplicated and returned sorted ascending.
pub fn extract_page_citations(text: &str) -> Vec<u32> {
    let pattern = Regex::new(r"\(Page\s+(\d+)\)").expect("Invalid regex");

    let mut pages: Vec<u32> = pattern
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    pages.sort_unstable();
    pages.dedup();
    pages
}
