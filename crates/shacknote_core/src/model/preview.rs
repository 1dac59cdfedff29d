//! List-row preview derived from editor markup.
//!
//! Rules:
//! - block-level closing tags and `<br>` become spaces so words do not fuse.
//! - remaining tags are removed and common HTML entities decoded.
//! - whitespace is collapsed and the first 100 chars are kept, with `...`
//!   appended when the text was longer.

use once_cell::sync::Lazy;
use regex::Regex;

const PREVIEW_MAX_CHARS: usize = 100;

static BLOCK_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|h[1-6]|li|blockquote|pre|div)>").expect("valid break regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Derives a plain-text preview from stored note content.
pub fn note_preview(content: &str) -> String {
    let with_breaks = BLOCK_BREAK_RE.replace_all(content, " ");
    let without_tags = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&without_tags);
    let normalized = WHITESPACE_RE.replace_all(&decoded, " ");
    let trimmed = normalized.trim();

    let mut preview: String = trimmed.chars().take(PREVIEW_MAX_CHARS).collect();
    if trimmed.chars().count() > PREVIEW_MAX_CHARS {
        preview.push_str("...");
    }
    preview
}

fn decode_entities(value: &str) -> String {
    // `&amp;` last so `&amp;lt;` stays a literal `&lt;`.
    value
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
