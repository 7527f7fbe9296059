use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use shelfsearch_core::catalog::JsonCatalog;
use shelfsearch_core::config::SearchSettings;
use shelfsearch_core::traits::CatalogProvider;
use shelfsearch_text::{CatalogIndex, CatalogSearchEngine, SearchOptions};

// Search a catalog export and print ranked results with their score breakdown.
// Usage:
//   cargo run -p shelfsearch-text --example search -- "your query" \
//     [--catalog test_data/catalog.json] [--limit 8] [--max-price 500]

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: cargo run -p shelfsearch-text --example search -- <query> [--catalog PATH] [--limit N] [--max-price N]");
        std::process::exit(1);
    }
    let mut query = String::new();
    let mut catalog: Option<PathBuf> = None;
    let mut options = SearchOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--catalog" => {
                if i + 1 >= args.len() { eprintln!("--catalog requires a path"); std::process::exit(2); }
                catalog = Some(PathBuf::from(&args[i + 1]));
                i += 2; continue;
            }
            "--limit" => {
                if i + 1 >= args.len() { eprintln!("--limit requires a number"); std::process::exit(2); }
                options.limit = args[i + 1].parse().ok();
                i += 2; continue;
            }
            "--max-price" => {
                if i + 1 >= args.len() { eprintln!("--max-price requires a number"); std::process::exit(2); }
                options.max_price = args[i + 1].parse().ok();
                i += 2; continue;
            }
            s if s.starts_with("--") => {
                eprintln!("Unknown flag: {}", s); std::process::exit(2);
            }
            s => {
                if query.is_empty() { query = s.to_string(); } else { query.push(' '); query.push_str(s); }
                i += 1; continue;
            }
        }
    }

    // Resolve catalog path precedence: flag > SHELF_CATALOG__PATH > workspace-relative fallback
    let catalog = if let Some(path) = catalog {
        path
    } else if let Ok(env_path) = env::var("SHELF_CATALOG__PATH") {
        PathBuf::from(env_path)
    } else {
        let base = Path::new(env!("CARGO_MANIFEST_DIR"))
            .ancestors().nth(2)
            .unwrap_or(Path::new("."));
        base.join("test_data/catalog.json")
    };

    println!("Catalog search\n==============");
    println!("Catalog: {}", catalog.display());
    println!("Query: {}\n", query);

    let snapshot = JsonCatalog::new(catalog).load()?;
    let engine = CatalogSearchEngine::new(Arc::new(CatalogIndex::build(snapshot)), SearchSettings::default());
    let outcome = engine.search(&query, options)?;
    println!("tokens={:?} expanded={:?} ceiling={:?}\n", outcome.query.tokens, outcome.query.expanded, outcome.price_ceiling);
    for (i, r) in outcome.results.iter().enumerate() {
        println!("{:>2}. score={} matched={} fuzzy={} handle={} price={} {}\n    {}",
            i + 1, r.score.total, r.score.matched_tokens, r.score.fuzzy_prefix,
            r.record.handle, r.pricing.amount, r.pricing.currency, r.record.title);
    }
    if outcome.no_match {
        println!("{}", engine.settings().no_match_text(outcome.price_ceiling));
    }

    Ok(())
}
