//! Markup flattening and title policy.
//!
//! # Invariants
//! - Lengths count Unicode scalar values, not bytes.
//! - Capture titles always end in the ellipsis marker, even for short text.
//! - Derived titles get the marker only when the plain text was cut.
//! - Title derivation never fails; empty text falls back to `DEFAULT_TITLE`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const TITLE_MAX_CHARS: usize = 30;
pub const ELLIPSIS: &str = "...";
pub const DEFAULT_TITLE: &str = "New Note";

// A tag opens only at `<` followed by a letter, `/`, `!` or `?`; any other
// `<` is literal text.
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^>]*>|<[!?][^>]*>").expect("valid tag regex")
});
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid entity regex")
});

/// Flattens rich-text markup to its text content.
///
/// Tags and comments are dropped without inserting separators, and common
/// character references are decoded. Whitespace is kept as written.
pub fn strip_markup(markup: &str) -> String {
    let without_tags = TAG_RE.replace_all(markup, "");
    ENTITY_RE
        .replace_all(&without_tags, |caps: &Captures<'_>| decode_entity(&caps[1], &caps[0]))
        .into_owned()
}

/// Title for a freshly captured selection: first 30 chars plus `...`.
pub fn capture_title(selection: &str) -> String {
    let mut title = take_chars(selection, TITLE_MAX_CHARS);
    title.push_str(ELLIPSIS);
    title
}

/// Title for a saved note whose title was never set by hand.
pub fn derive_title(markup: &str) -> String {
    let plain = strip_markup(markup);
    if plain.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    let mut title = take_chars(&plain, TITLE_MAX_CHARS);
    if plain.chars().count() > TITLE_MAX_CHARS {
        title.push_str(ELLIPSIS);
    }
    title
}

fn take_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn decode_entity(body: &str, raw: &str) -> String {
    let decoded = match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => body
            .strip_prefix("#x")
            .or_else(|| body.strip_prefix("#X"))
            .map(|hex| u32::from_str_radix(hex, 16))
            .or_else(|| body.strip_prefix('#').map(str::parse::<u32>))
            .and_then(Result::ok)
            .and_then(char::from_u32),
    };
    decoded.map_or_else(|| raw.to_string(), String::from)
}
