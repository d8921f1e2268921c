/*!
 * Prose-preserving chunking of masked text.
 *
 * Splits a masked buffer into chunks at paragraph boundaries, keeping
 * each chunk under a character budget. Separators are kept with the
 * preceding paragraph so that concatenating the chunks reproduces the
 * input exactly. Placeholder tokens contain no blank lines, so a chunk
 * boundary can never split one.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Paragraph separator: one or more blank lines
static PARAGRAPH_BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("Invalid paragraph break regex"));

/// Split `text` into chunks of at most `max_chars` characters, breaking
/// only at paragraph boundaries. A single paragraph longer than the
/// budget becomes its own oversized chunk rather than being split
/// mid-sentence.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    // Paragraphs with their trailing separators attached
    let mut pieces = Vec::new();
    let mut cursor = 0usize;
    for sep in PARAGRAPH_BREAK_REGEX.find_iter(text) {
        pieces.push(&text[cursor..sep.end()]);
        cursor = sep.end();
    }
    if cursor < text.len() {
        pieces.push(&text[cursor..]);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if !current.is_empty() && current.chars().count() + piece.chars().count() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(piece);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
