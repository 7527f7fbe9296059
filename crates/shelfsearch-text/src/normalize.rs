//! Text canonicalization and query pattern recognition.
//!
//! Nothing here fails: foreign scripts, emoji and empty input all degrade to
//! empty strings or `None`.
use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_CEILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:under|below|less\s+than)\s*(?:₹|rs\.?|inr|\$)?\s*(\d+)")
        .expect("price ceiling pattern")
});
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup tag pattern"));
static HTML_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#\d+|#x[0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern"));

/// Lowercase, turn everything outside `[a-z0-9]` into a separator, collapse
/// whitespace and trim.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Whitespace split of already normalized text.
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// True iff the trimmed raw text is exactly 10 or 13 ASCII digits.
pub fn is_isbn_candidate(text: &str) -> bool {
    let trimmed = text.trim();
    matches!(trimmed.len(), 10 | 13) && trimmed.bytes().all(|b| b.is_ascii_digit())
}

/// Amount from the first "under/below/less than ₹N" clause, if any.
pub fn extract_price_ceiling(text: &str) -> Option<u64> {
    PRICE_CEILING
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Leading `len` characters of the first token.
pub fn fuzzy_key(tokens: &[String], len: usize) -> Option<String> {
    let first = tokens.first()?;
    let key: String = first.chars().take(len).collect();
    (!key.is_empty()).then_some(key)
}

/// Drop markup tags and entities, leaving separators behind.
pub fn strip_markup(text: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(text, " ");
    HTML_ENTITY.replace_all(&without_tags, " ").into_owned()
}

pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}
