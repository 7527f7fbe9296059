//! Weighted multi-field relevance scoring.
//!
//! Every expanded query token is checked for substring containment in each
//! field class and adds that class's full weight on a hit, so a field that
//! matches several tokens contributes several times. On top of that come a
//! fuzzy-prefix bonus for the title or author and a bonus per distinct
//! matched token.
use shelfsearch_core::config::Weights;
use shelfsearch_core::types::CatalogRecord;

use crate::index::NormalizedFields;
use crate::query::ParsedQuery;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub total: u32,
    /// Distinct expanded tokens that hit at least one field.
    pub matched_tokens: usize,
    pub fuzzy_prefix: bool,
    /// Every original query token (two or more) appears in the author field,
    /// in any order.
    pub author_full_name: bool,
}

impl Score {
    pub fn is_relevant(&self) -> bool {
        self.total > 0
    }
}

fn contains(field: &str, token: &str) -> bool {
    !field.is_empty() && field.contains(token)
}

fn token_weight(fields: &NormalizedFields, query: &ParsedQuery, token: &str, weights: &Weights) -> u32 {
    let classes = [
        (contains(&fields.title, token), weights.title),
        (contains(&fields.author, token), weights.author),
        (contains(&fields.readers_category, token), weights.readers_category),
        (
            query.isbn.as_deref() == Some(token) && contains(&fields.isbn, token),
            weights.isbn,
        ),
        (contains(&fields.author_location, token), weights.author_location),
        (contains(&fields.vendor, token), weights.vendor),
        (contains(&fields.language, token), weights.language),
        (fields.tags.iter().any(|tag| tag.contains(token)), weights.tags),
        (contains(&fields.description, token), weights.description),
        (fields.misc.iter().any(|m| m.contains(token)), weights.misc),
    ];
    classes
        .iter()
        .filter(|(hit, _)| *hit)
        .fold(0u32, |acc, (_, weight)| acc.saturating_add(*weight))
}

pub fn score(fields: &NormalizedFields, query: &ParsedQuery, weights: &Weights) -> Score {
    let mut total = 0u32;
    let mut matched_tokens = 0usize;
    for token in &query.expanded {
        let weight = token_weight(fields, query, token, weights);
        if weight > 0 {
            total = total.saturating_add(weight);
            matched_tokens += 1;
        }
    }

    let author_full_name = query.tokens.len() > 1
        && query.tokens.iter().all(|t| contains(&fields.author, t));

    let fuzzy_prefix = query
        .fuzzy_key
        .as_deref()
        .is_some_and(|key| fields.title.starts_with(key) || fields.author.starts_with(key));
    if fuzzy_prefix {
        total = total.saturating_add(weights.fuzzy_prefix);
    }

    let coverage = u32::try_from(matched_tokens).unwrap_or(u32::MAX).saturating_mul(weights.token_coverage);
    total = total.saturating_add(coverage);

    Score { total, matched_tokens, fuzzy_prefix, author_full_name }
}

/// Score a record without a prebuilt index.
pub fn score_record(record: &CatalogRecord, query: &ParsedQuery, weights: &Weights) -> Score {
    score(&NormalizedFields::from_record(record), query, weights)
}
