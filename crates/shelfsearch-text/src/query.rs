use std::collections::HashSet;

use shelfsearch_core::config::SearchSettings;
use shelfsearch_core::error::{Error, Result};

use crate::normalize::{extract_price_ceiling, fuzzy_key, is_isbn_candidate, normalize, tokenize};
use crate::synonyms::SynonymExpander;

/// A query after normalization, tokenization and expansion.
///
/// - `tokens`: original query tokens in order, stop words removed
/// - `expanded`: `tokens` plus synonym terms; what the scorer matches
/// - `fuzzy_key`: leading characters of the first token
/// - `isbn`: the digits of an ISBN-shaped query, which enables ISBN matching
/// - `price_ceiling`: amount from an "under ₹N" clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub raw: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub expanded: Vec<String>,
    pub isbn: Option<String>,
    pub price_ceiling: Option<u64>,
    pub fuzzy_key: Option<String>,
}

impl ParsedQuery {
    pub fn parse(raw: &str, settings: &SearchSettings, synonyms: &SynonymExpander) -> Result<Self> {
        let normalized = normalize(raw);
        let meaningful = normalized.chars().filter(|c| *c != ' ').count();
        if meaningful < settings.min_query_chars {
            return Err(Error::InvalidQuery(format!(
                "query needs at least {} letters or digits",
                settings.min_query_chars
            )));
        }

        let all_tokens = tokenize(&normalized);
        let stop_words: HashSet<&str> = settings.stop_words.iter().map(String::as_str).collect();
        let mut tokens: Vec<String> = Vec::with_capacity(all_tokens.len());
        for token in &all_tokens {
            if !stop_words.contains(token.as_str()) && !tokens.contains(token) {
                tokens.push(token.clone());
            }
        }
        let expanded = synonyms.expand(&tokens);

        Ok(Self {
            raw: raw.to_string(),
            isbn: is_isbn_candidate(raw).then(|| raw.trim().to_string()),
            price_ceiling: extract_price_ceiling(raw),
            fuzzy_key: fuzzy_key(&tokens, settings.fuzzy_prefix_len),
            normalized,
            tokens,
            expanded,
        })
    }

    pub fn is_isbn(&self) -> bool {
        self.isbn.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<ParsedQuery> {
        ParsedQuery::parse(raw, &SearchSettings::default(), &SynonymExpander::default())
    }

    #[test]
    fn rejects_short_or_empty_queries() {
        assert!(matches!(parse(""), Err(Error::InvalidQuery(_))));
        assert!(matches!(parse("  ?! "), Err(Error::InvalidQuery(_))));
        assert!(matches!(parse("a"), Err(Error::InvalidQuery(_))));
        assert!(matches!(parse("ध्यान"), Err(Error::InvalidQuery(_))));
        assert!(parse("om").is_ok());
    }

    #[test]
    fn derives_tokens_ceiling_and_fuzzy_key() {
        let q = parse("Show me Yoga books under ₹300").expect("parse");
        assert_eq!(q.normalized, "show me yoga books under 300");
        assert_eq!(q.tokens, vec!["yoga", "books", "under", "300"]);
        assert_eq!(q.price_ceiling, Some(300));
        assert_eq!(q.fuzzy_key.as_deref(), Some("yoga"));
        assert!(!q.is_isbn());
    }

    #[test]
    fn isbn_queries_keep_digits() {
        let q = parse(" 9788120835603 ").expect("parse");
        assert_eq!(q.isbn.as_deref(), Some("9788120835603"));
        assert_eq!(q.tokens, vec!["9788120835603"]);
    }

    #[test]
    fn expansion_adds_synonyms_once() {
        let q = parse("jyotish kitab kitab").expect("parse");
        assert_eq!(q.tokens, vec!["jyotish", "kitab"]);
        assert_eq!(q.expanded, vec!["jyotish", "kitab", "astrology", "book"]);
    }

    #[test]
    fn stop_words_only_query_has_no_tokens() {
        let q = parse("the and of").expect("parse");
        assert!(q.tokens.is_empty());
        assert_eq!(q.fuzzy_key, None);
    }
}
