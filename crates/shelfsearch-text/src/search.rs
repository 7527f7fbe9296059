use std::cmp::Ordering;
use std::sync::Arc;

use shelfsearch_core::config::SearchSettings;
use shelfsearch_core::error::Result;
use shelfsearch_core::types::{CatalogRecord, Pricing, ProductCard, SearchResponse};
use tracing::debug;

use crate::index::{CatalogIndex, IndexedRecord};
use crate::query::ParsedQuery;
use crate::scoring::{score, Score};
use crate::synonyms::SynonymExpander;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Defaults to `search.default_limit`, capped at `search.max_limit`.
    pub limit: Option<usize>,
    /// Caller-supplied budget; combined with any "under ₹N" clause by taking
    /// the lower of the two.
    pub max_price: Option<u64>,
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredResult<'a> {
    pub record: &'a CatalogRecord,
    pub pricing: &'a Pricing,
    pub score: Score,
}

impl ScoredResult<'_> {
    pub fn to_card(&self, link_prefix: Option<&str>) -> ProductCard {
        ProductCard::new(self.record, self.pricing, self.score.total, link_prefix)
    }
}

/// Ranked results of one query. An empty `results` with `no_match` set is a
/// normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct SearchOutcome<'a> {
    pub query: ParsedQuery,
    pub results: Vec<ScoredResult<'a>>,
    /// Relevant records before truncation to the limit.
    pub total_matches: usize,
    pub no_match: bool,
    /// Ceiling actually applied: the lower of the extracted and requested one.
    pub price_ceiling: Option<u64>,
}

impl SearchOutcome<'_> {
    pub fn into_response(self, settings: &SearchSettings) -> SearchResponse {
        let link_prefix = settings.product_url_prefix.as_deref();
        let products: Vec<ProductCard> = self.results.iter().map(|r| r.to_card(link_prefix)).collect();
        let text = self.no_match.then(|| settings.no_match_text(self.price_ceiling));
        SearchResponse { products, no_match: self.no_match, text }
    }
}

/// Relevance search over one immutable catalog index.
pub struct CatalogSearchEngine {
    index: Arc<CatalogIndex>,
    settings: SearchSettings,
    synonyms: SynonymExpander,
}

impl CatalogSearchEngine {
    pub fn new(index: Arc<CatalogIndex>, settings: SearchSettings) -> Self {
        let synonyms = SynonymExpander::with_extra(&settings.synonyms);
        Self { index, settings, synonyms }
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn parse(&self, query: &str) -> Result<ParsedQuery> {
        ParsedQuery::parse(query, &self.settings, &self.synonyms)
    }

    /// Fails only with `Error::InvalidQuery`; everything else degrades to a
    /// no-match outcome.
    pub fn search(&self, query: &str, options: SearchOptions) -> Result<SearchOutcome<'_>> {
        let parsed = self.parse(query)?;
        Ok(self.search_parsed(parsed, options))
    }

    pub fn search_parsed(&self, query: ParsedQuery, options: SearchOptions) -> SearchOutcome<'_> {
        let limit = self.settings.effective_limit(options.limit);
        let price_ceiling = match (query.price_ceiling, options.max_price) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let mut results: Vec<ScoredResult<'_>> = self
            .index
            .entries()
            .iter()
            .filter_map(|entry| {
                let s = score(&entry.fields, &query, &self.settings.weights);
                s.is_relevant().then(|| to_result(entry, s))
            })
            .filter(|r| within_ceiling(r.pricing, price_ceiling))
            .collect();

        // Stable sort: equal scores keep catalog order unless a budget was
        // given, in which case the cheaper record comes first.
        results.sort_by(|a, b| {
            let by_score = b.score.total.cmp(&a.score.total);
            match price_ceiling {
                Some(_) => by_score.then_with(|| {
                    a.pricing.amount.partial_cmp(&b.pricing.amount).unwrap_or(Ordering::Equal)
                }),
                None => by_score,
            }
        });

        let total_matches = results.len();
        results.truncate(limit);
        debug!(
            query = %query.normalized,
            tokens = query.expanded.len(),
            ceiling = ?price_ceiling,
            matches = total_matches,
            returned = results.len(),
            "catalog search"
        );

        SearchOutcome {
            query,
            results,
            total_matches,
            no_match: total_matches == 0,
            price_ceiling,
        }
    }
}

fn to_result(entry: &IndexedRecord, score: Score) -> ScoredResult<'_> {
    ScoredResult { record: &entry.record, pricing: &entry.pricing, score }
}

fn within_ceiling(pricing: &Pricing, ceiling: Option<u64>) -> bool {
    ceiling.map_or(true, |c| pricing.amount <= c as f64)
}

/// One-off search over a plain record slice. Builds a throwaway index, so
/// long-lived callers should keep a [`CatalogSearchEngine`] instead.
pub fn search(
    catalog: &[CatalogRecord],
    query: &str,
    options: SearchOptions,
    settings: &SearchSettings,
) -> Result<SearchResponse> {
    let index = Arc::new(CatalogIndex::from_records(catalog.to_vec()));
    let engine = CatalogSearchEngine::new(index, settings.clone());
    Ok(engine.search(query, options)?.into_response(settings))
}
