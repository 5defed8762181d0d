//! PDF text extraction with page tracking

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Text content of a single page
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Cleaned text content; empty for pages with no extractable text
    pub text: String,
}

/// A parsed PDF: page-level text plus document-level metadata
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Ordered pages; pages without extractable text are present but empty
    pub pages: Vec<PageText>,
    /// Total pages in the document
    pub total_pages: u32,
    /// SHA-256 of the extracted text, hex-encoded
    pub content_hash: String,
}

impl PdfContent {
    /// Count pages that contributed any text
    pub fn non_empty_pages(&self) -> usize {
        self.pages.iter().filter(|p| !p.text.trim().is_empty()).count()
    }
}

/// PDF parser with per-page extraction and a whole-document fallback
pub struct PdfParser;

impl PdfParser {
    /// Parse a PDF from memory.
    ///
    /// Page-by-page extraction via `lopdf` is preferred because it preserves
    /// page anchors for citations. When that fails (encrypted files, exotic
    /// content streams), the whole document is extracted with `pdf-extract`
    /// and attributed to page 1 as a best effort.
    pub fn parse(filename: &str, data: &[u8]) -> Result<PdfContent> {
        match Self::parse_per_page(data) {
            Ok(content) if content.non_empty_pages() > 0 => Ok(content),
            Ok(_) | Err(_) => Self::parse_whole(filename, data),
        }
    }

    /// Extract each page's text separately
    fn parse_per_page(data: &[u8]) -> Result<PdfContent> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse("document.pdf", format!("Failed to load PDF: {}", e)))?;

        let page_map = doc.get_pages();
        let total_pages = page_map.len() as u32;
        let mut pages = Vec::with_capacity(page_map.len());

        for (&page_number, _) in page_map.iter() {
            // A page that yields no text (scanned image, extraction failure)
            // still gets an entry; it contributes zero chunks downstream.
            let text = match doc.extract_text(&[page_number]) {
                Ok(raw) => cleanup_text(&raw),
                Err(e) => {
                    tracing::debug!("No text extracted from page {}: {}", page_number, e);
                    String::new()
                }
            };
            pages.push(PageText { page_number, text });
        }

        let content_hash = hash_pages(&pages);

        Ok(PdfContent {
            pages,
            total_pages,
            content_hash,
        })
    }

    /// Whole-document fallback: all text lands on page 1, but the real page
    /// count is still reported when the page map is readable
    fn parse_whole(filename: &str, data: &[u8]) -> Result<PdfContent> {
        let raw = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Text extraction failed: {}", e)))?;

        let text = cleanup_text(&raw);
        if text.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted; the PDF may be image-based",
            ));
        }

        let total_pages = lopdf::Document::load_mem(data)
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(1)
            .max(1);

        let pages = vec![PageText {
            page_number: 1,
            text,
        }];
        let content_hash = hash_pages(&pages);

        Ok(PdfContent {
            pages,
            total_pages,
            content_hash,
        })
    }
}

/// Clean extracted text: normalize glyph artifacts, strip control
/// characters, and collapse whitespace runs while keeping paragraph breaks
pub fn cleanup_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\u{FB00}' => cleaned.push_str("ff"),
            '\u{FB01}' => cleaned.push_str("fi"),
            '\u{FB02}' => cleaned.push_str("fl"),
            '\u{FB03}' => cleaned.push_str("ffi"),
            '\u{FB04}' => cleaned.push_str("ffl"),
            '\u{2018}' | '\u{2019}' => cleaned.push('\''),
            '\u{201C}' | '\u{201D}' => cleaned.push('"'),
            '\u{2010}' | '\u{2011}' | '\u{2013}' | '\u{2014}' => cleaned.push('-'),
            '\u{2022}' => cleaned.push('*'),
            '\u{2026}' => cleaned.push_str("..."),
            '\u{00A0}' => cleaned.push(' '),
            '\r' => {}
            c if c.is_control() && c != '\n' => {}
            c => cleaned.push(c),
        }
    }

    // Collapse horizontal whitespace, trim line ends, cap blank-line runs
    let mut out = String::with_capacity(cleaned.len());
    let mut blank_run = 0usize;
    for line in cleaned.lines() {
        let line: String = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.trim().to_string()
}

/// SHA-256 over the concatenated page texts, hex-encoded
fn hash_pages(pages: &[PageText]) -> String {
    let mut hasher = Sha256::new();
    for page in pages {
        hasher.update(page.text.as_bytes());
        hasher.update([0u8]); // page separator
    }
    hex::encode(hasher.finalize())
}
