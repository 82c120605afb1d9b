//! Keyword parsing for the advanced search form.
//!
//! The form has four keyword fields which are folded into a single query
//! string in the engine's boolean syntax:
//!
//! | Field | Form name | Emitted as |
//! |-------|-----------|------------|
//! | All words | `+` | `+alpha +beta` |
//! | Exact phrase | `quote` | `"hello world"` |
//! | At least one of the words | `any` | verbatim |
//! | Without the words | `-` | `-gamma -delta` |
//!
//! A query that ends up starting with `-` has no positive term to match, so
//! it is rewritten to the raw exclusion words with the inverted-match flag
//! set: the engine returns documents that do *not* match those words.
//!
//! Engine-reserved characters are passed through unescaped.

use serde::{Deserialize, Serialize};

/// Prefix marking a word every result must contain.
pub const MANDATORY_MARKER: char = '+';
/// Prefix marking a word no result may contain.
pub const EXCLUSION_MARKER: char = '-';

/// Raw values of the four keyword fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordInput {
    /// `+` field.
    pub all_words: Option<String>,
    /// `quote` field.
    pub exact_phrase: Option<String>,
    /// `any` field.
    pub any_words: Option<String>,
    /// `-` field.
    pub without_words: Option<String>,
}

/// Output of [`parse_keywords`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    pub text: String,
    /// Match documents that do NOT match `text`.
    pub inverted: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn prefix_tokens(raw: &str, marker: char) -> String {
    raw.split_whitespace()
        .map(|token| format!("{marker}{token}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fold the keyword fields into one query string.
///
/// This is also the "current query" accessor: it never inverts.
pub fn compose_keywords(input: &KeywordInput) -> String {
    let mut keywords = String::new();

    if let Some(words) = present(&input.all_words) {
        keywords.push(' ');
        keywords.push_str(&prefix_tokens(words, MANDATORY_MARKER));
    }
    if let Some(phrase) = present(&input.exact_phrase) {
        keywords.push_str(" \"");
        keywords.push_str(phrase);
        keywords.push('"');
    }
    if let Some(words) = present(&input.any_words) {
        keywords.push(' ');
        keywords.push_str(words);
    }
    if let Some(words) = present(&input.without_words) {
        keywords.push(' ');
        keywords.push_str(&prefix_tokens(words, EXCLUSION_MARKER));
    }

    keywords.trim().to_string()
}

/// Fold the keyword fields into the query handed to the engine.
///
/// When the folded query starts with the exclusion marker, every other
/// fragment is dropped: the text becomes the raw `-` field and
/// [`ParsedQuery::inverted`] is set.
pub fn parse_keywords(input: &KeywordInput) -> ParsedQuery {
    let text = compose_keywords(input);

    if text.starts_with(EXCLUSION_MARKER) {
        return ParsedQuery {
            text: input.without_words.clone().unwrap_or_default(),
            inverted: true,
        };
    }

    ParsedQuery {
        text,
        inverted: false,
    }
}

/// Append a prefix wildcard (`*`) to every bare word.
///
/// Quoted phrases are kept intact, including ones spanning several words.
/// Words already ending in `*` are left alone.
pub fn add_stars_to_keywords(keywords: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut words = keywords.split_whitespace();

    while let Some(word) = words.next() {
        let body = word.trim_start_matches([MANDATORY_MARKER, EXCLUSION_MARKER]);

        if body.starts_with('"') {
            let mut phrase = word.to_string();
            let closed = body.len() > 1 && body.ends_with('"');
            if !closed {
                for next in words.by_ref() {
                    phrase.push(' ');
                    phrase.push_str(next);
                    if next.ends_with('"') {
                        break;
                    }
                }
            }
            out.push(phrase);
        } else if body.is_empty() || body.ends_with('*') {
            out.push(word.to_string());
        } else {
            out.push(format!("{word}*"));
        }
    }

    out.join(" ")
}
