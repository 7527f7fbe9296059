//! Colloquial and transliterated vocabulary expansion.
//!
//! The catalog is tagged in English while shoppers often type Hindi words in
//! Latin script ("jyotish kitab"). Each such token adds its English terms to
//! the query. Expansion is one level deep and never removes a token.
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::normalize::normalize;

const BUILTIN: &[(&str, &[&str])] = &[
    ("kitab", &["book"]),
    ("kitaab", &["book"]),
    ("kitabe", &["books"]),
    ("kitaben", &["books"]),
    ("pustak", &["book"]),
    ("granth", &["scripture"]),
    ("shastra", &["scripture"]),
    ("gyan", &["knowledge"]),
    ("gyaan", &["knowledge"]),
    ("vidya", &["knowledge"]),
    ("jyotish", &["astrology"]),
    ("jyotisha", &["astrology"]),
    ("itihas", &["history"]),
    ("kahani", &["stories", "story"]),
    ("kahaniyan", &["stories"]),
    ("upanyas", &["novel"]),
    ("kavita", &["poetry"]),
    ("dharm", &["religion"]),
    ("dharmik", &["religion", "religious"]),
    ("adhyatm", &["spirituality"]),
    ("adhyatmik", &["spiritual", "spirituality"]),
    ("dhyan", &["meditation"]),
    ("dhyana", &["meditation"]),
    ("yog", &["yoga"]),
    ("ayurved", &["ayurveda"]),
    ("swasthya", &["health"]),
    ("bachche", &["children"]),
    ("bachchon", &["children"]),
    ("bal", &["children"]),
    ("vigyan", &["science"]),
    ("ganit", &["mathematics"]),
    ("darshan", &["philosophy"]),
    ("jeevani", &["biography"]),
    ("geeta", &["gita"]),
    ("ramayan", &["ramayana"]),
    ("mahabharat", &["mahabharata"]),
    ("ved", &["vedas"]),
    ("sanskriti", &["culture"]),
    ("bhasha", &["language"]),
];

#[derive(Debug, Clone)]
pub struct SynonymExpander {
    map: HashMap<String, Vec<String>>,
}

impl Default for SynonymExpander {
    fn default() -> Self {
        Self::with_extra(&BTreeMap::new())
    }
}

impl SynonymExpander {
    /// Built-in vocabulary with `extra` entries merged over it. Keys and
    /// terms are normalized; multi-word terms become several tokens.
    pub fn with_extra(extra: &BTreeMap<String, Vec<String>>) -> Self {
        let builtin = BUILTIN
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect::<Vec<_>>()));
        let configured = extra.iter().map(|(k, vs)| (k.clone(), vs.clone()));

        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, terms) in builtin.chain(configured) {
            let key = normalize(&key);
            if key.is_empty() || key.contains(' ') {
                continue;
            }
            let mut canonical = Vec::new();
            for term in terms.iter().flat_map(|t| normalize(t).split(' ').map(str::to_string).collect::<Vec<_>>()) {
                if !term.is_empty() && term != key && !canonical.contains(&term) {
                    canonical.push(term);
                }
            }
            if !canonical.is_empty() {
                map.insert(key, canonical);
            }
        }
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn lookup(&self, token: &str) -> Option<&[String]> {
        self.map.get(token).map(Vec::as_slice)
    }

    /// Input tokens first, in order, then canonical terms; duplicates removed.
    pub fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut expanded = Vec::with_capacity(tokens.len());
        for token in tokens {
            if seen.insert(token) {
                expanded.push(token.clone());
            }
        }
        for token in tokens {
            for term in self.lookup(token).unwrap_or_default() {
                if seen.insert(term) {
                    expanded.push(term.clone());
                }
            }
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::tokenize;

    #[test]
    fn expands_colloquial_terms_and_keeps_originals() {
        let expander = SynonymExpander::default();
        let out = expander.expand(&tokenize("jyotish kitab"));
        assert_eq!(out, vec!["jyotish", "kitab", "astrology", "book"]);
    }

    #[test]
    fn unknown_tokens_pass_through() {
        let expander = SynonymExpander::default();
        assert_eq!(expander.expand(&tokenize("david frawley")), vec!["david", "frawley"]);
        assert!(expander.expand(&[]).is_empty());
    }

    #[test]
    fn expansion_is_one_level_and_deduplicated() {
        let mut extra = BTreeMap::new();
        extra.insert("astrology".to_string(), vec!["stars".to_string()]);
        let expander = SynonymExpander::with_extra(&extra);
        let out = expander.expand(&tokenize("jyotish jyotisha astrology"));
        assert_eq!(out, vec!["jyotish", "jyotisha", "astrology", "stars"]);
        assert!(!expander.expand(&tokenize("jyotish")).contains(&"stars".to_string()));
    }

    #[test]
    fn configured_entries_are_normalized() {
        let mut extra = BTreeMap::new();
        extra.insert("Shastra-Gyan".to_string(), vec!["x".to_string()]);
        extra.insert("Pothi".to_string(), vec!["Sacred Book".to_string(), "BOOK".to_string()]);
        let expander = SynonymExpander::with_extra(&extra);
        assert_eq!(expander.lookup("pothi"), Some(&["sacred".to_string(), "book".to_string()][..]));
        assert_eq!(expander.lookup("shastra gyan"), None, "multi-word keys are ignored");
    }

    #[test]
    fn configured_entries_override_builtin() {
        let mut extra = BTreeMap::new();
        extra.insert("kitab".to_string(), vec!["books".to_string()]);
        let expander = SynonymExpander::with_extra(&extra);
        assert_eq!(expander.lookup("kitab"), Some(&["books".to_string()][..]));
    }
}
