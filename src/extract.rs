//! Text extraction collaborators for the content-analysis stage.
//!
//! Two narrow contracts: pull plain text out of a document (empty string on
//! any failure, never an error), and boil text down to a set of significant
//! terms for keyword intersection. The term extraction is deliberately crude;
//! the classifier only needs a set to intersect with rule keywords.

use std::collections::HashSet;
use std::path::Path;

/// Tokens shorter than this carry no signal.
const MIN_TERM_LEN: usize = 3;

/// Common English filler words, excluded from significant terms.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "with", "this", "that", "those", "these", "from",
    "has", "have", "had", "not", "but", "you", "your", "all", "any", "can", "will", "would",
    "should", "there", "their", "they", "them", "its", "our", "out", "about", "into", "over",
    "under", "when", "what", "which", "who", "how", "been", "being", "more", "most", "some",
    "such", "than", "then", "too", "very", "also", "each", "per", "via",
];

/// Extracts plain text from a structured document, lowercased.
///
/// Currently understands PDF. Returns an empty string on any failure; a
/// document the extractor cannot read simply contributes no terms.
pub fn document_text(path: &Path) -> String {
    match pdf_extract::extract_text(path) {
        Ok(text) => text.to_lowercase(),
        Err(e) => {
            log::warn!("Could not extract text from {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Reads a file as lossy UTF-8 text, lowercased.
///
/// Undecodable bytes are replaced rather than treated as an error; a file
/// that cannot be read at all yields an empty string.
pub fn plain_text(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_lowercase(),
        Err(e) => {
            log::warn!("Could not read {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Extracts the set of significant terms from at most the first `max_chars`
/// characters of `text`.
///
/// The cap is a cost control: the remainder of a large document is never
/// scanned. Tokens are split on non-alphanumeric boundaries, lowercased, and
/// filtered against a stop-word list.
pub fn significant_terms(text: &str, max_chars: usize) -> HashSet<String> {
    let head: String = text.chars().take(max_chars).collect();
    head.split(|c: char| !c.is_alphanumeric())
        .map(|token| token.to_lowercase())
        .filter(|token| token.len() >= MIN_TERM_LEN)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect()
}
