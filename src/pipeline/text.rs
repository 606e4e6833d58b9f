//! Text normalisation: turn raw per-page PDF text into one clean string.
//!
//! PDF text layers are noisy: hard line breaks in the middle of sentences,
//! runs of spaces used for layout, running "Page 3" footers, and spaces
//! floating before punctuation where the extractor split glyph runs. None of
//! that carries meaning for the model, and it costs tokens.
//!
//! ## Rule Order
//!
//! 1. Unicode NFC (accents and non-Latin scripts are kept, only composed)
//! 2. Collapse every whitespace run to a single space
//! 3. Strip `Page <digits>` tokens, case-insensitive
//! 4. Remove whitespace immediately before `? . ! , ; :`
//! 5. Trim
//!
//! Steps 1–4 repeat until nothing changes: removing a `Page 12` token can
//! leave two spaces side by side, splice letters back into a new token, or
//! put a combining mark next to a new base character. Running to a fixpoint
//! is what makes `clean_text` idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Separator inserted between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Normalised document text.
///
/// Only constructed through [`clean_text`], so the invariants hold for every
/// value: no `Page <digits>` substring, no double spaces, no space before
/// `?.!,;:`, no leading or trailing whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Join page texts (skipping pages without text) and clean the result.
    pub fn from_pages(pages: &[Option<String>]) -> Self {
        Self(clean_text(&join_pages(pages)))
    }

    /// Clean arbitrary raw text.
    pub fn from_raw(raw: &str) -> Self {
        Self(clean_text(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtractedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Concatenate page texts with a blank line between pages.
///
/// `None` entries are pages without a text layer; they are skipped rather
/// than producing an empty block.
pub fn join_pages(pages: &[Option<String>]) -> String {
    pages
        .iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// Apply all normalisation rules. See the module docs for the order.
pub fn clean_text(input: &str) -> String {
    let mut s: String = input.nfc().collect();
    loop {
        let next: String =
            remove_space_before_punctuation(&strip_page_markers(&collapse_whitespace(&s)))
                .nfc()
                .collect();
        if next == s {
            break;
        }
        s = next;
    }
    s.trim().to_string()
}

// ── Rule 2: Collapse whitespace ──────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}

// ── Rule 3: Strip page markers ───────────────────────────────────────────────

static RE_PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)page \d+").unwrap());

fn strip_page_markers(input: &str) -> String {
    RE_PAGE_MARKER.replace_all(input, "").into_owned()
}

// ── Rule 4: No whitespace before punctuation ─────────────────────────────────

static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([?.!,;:])").unwrap());

fn remove_space_before_punctuation(input: &str) -> String {
    RE_SPACE_BEFORE_PUNCT.replace_all(input, "$1").into_owned()
}
