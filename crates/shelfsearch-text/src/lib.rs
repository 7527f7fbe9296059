//! shelfsearch-text
//!
//! Relevance engine for the book catalog: text normalization, colloquial
//! synonym expansion, a precomputed field index and weighted scoring. See
//! `search` for the entry points and `examples/` for CLI-like usage during
//! development.

pub mod index;
pub mod normalize;
pub mod query;
pub mod scoring;
pub mod search;
pub mod synonyms;

pub use index::CatalogIndex;
pub use query::ParsedQuery;
pub use search::{search, CatalogSearchEngine, ScoredResult, SearchOptions, SearchOutcome};
pub use synonyms::SynonymExpander;
