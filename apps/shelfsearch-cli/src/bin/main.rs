use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelfsearch_core::catalog::JsonCatalog;
use shelfsearch_core::config::Config;
use shelfsearch_core::traits::CatalogProvider;
use shelfsearch_core::types::MetaSlot;
use shelfsearch_text::{CatalogIndex, CatalogSearchEngine, SearchOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shelfsearch")]
#[command(about = "Relevance search over a book catalog export")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Catalog JSON file or directory (default: catalog.path from config)
    #[arg(long, short = 'c', global = true)]
    catalog: Option<PathBuf>,

    /// Log scoring details to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank catalog records against a free-text query
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Maximum number of results (capped at search.max_limit)
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Only show records at or below this price
        #[arg(long)]
        max_price: Option<u64>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how a query is normalized, expanded and constrained
    Inspect {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Summarize the loaded catalog
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "shelfsearch_core=debug,shelfsearch_text=debug"
        } else {
            "info"
        })
    });
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.search_settings()?;
    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| config.catalog_path())
        .context("no catalog given: pass --catalog or set catalog.path")?;
    debug!(path = %catalog_path.display(), "loading catalog");

    let snapshot = JsonCatalog::new(&catalog_path).load()?;
    let index = Arc::new(CatalogIndex::build(snapshot));
    let engine = CatalogSearchEngine::new(index, settings.clone());

    match cli.command {
        Command::Query { text, limit, max_price, json } => {
            let query = text.join(" ");
            let outcome = engine.search(&query, SearchOptions { limit, max_price })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.into_response(&settings))?);
                return Ok(());
            }
            if outcome.no_match {
                println!("🔍 {}", settings.no_match_text(outcome.price_ceiling));
                return Ok(());
            }
            println!("🔍 {} of {} matches for '{}'", outcome.results.len(), outcome.total_matches, query);
            for (i, r) in outcome.results.iter().enumerate() {
                let card = r.to_card(settings.product_url_prefix.as_deref());
                let discount = card.discount.map(|d| format!(" ({})", d)).unwrap_or_default();
                println!("{:>2}. [{}] {} by {} {} {}{}", i + 1, card.score, card.title, card.author, card.currency, card.price, discount);
                if let Some(link) = card.link {
                    println!("    {}", link);
                }
            }
        }
        Command::Inspect { text } => {
            let q = engine.parse(&text.join(" "))?;
            println!("normalized: {}", q.normalized);
            println!("tokens:     {:?}", q.tokens);
            println!("expanded:   {:?}", q.expanded);
            println!("fuzzy key:  {}", q.fuzzy_key.as_deref().unwrap_or("-"));
            println!("isbn:       {}", q.isbn.as_deref().unwrap_or("-"));
            println!("ceiling:    {}", q.price_ceiling.map(|p| p.to_string()).unwrap_or_else(|| "-".into()));
        }
        Command::Stats => {
            let entries = engine.index().entries();
            let with_author = entries.iter().filter(|e| e.record.has_named_author()).count();
            let with_isbn = entries.iter().filter(|e| e.record.meta(MetaSlot::Isbn).is_some()).count();
            let discounted = entries.iter().filter(|e| e.pricing.discount_percent.is_some()).count();
            let prices = entries.iter().map(|e| e.pricing.amount);
            let min = prices.clone().fold(f64::INFINITY, f64::min);
            let max = prices.fold(0.0, f64::max);
            println!("📚 Catalog: {}", catalog_path.display());
            println!("   records:         {}", entries.len());
            println!("   named author:    {}", with_author);
            println!("   isbn metadata:   {}", with_isbn);
            println!("   discounted:      {}", discounted);
            if !entries.is_empty() {
                println!("   price range:     {} - {}", min, max);
            }

            let vendors: BTreeSet<&str> = entries
                .iter()
                .map(|e| e.record.publisher())
                .filter(|v| !v.is_empty())
                .collect();
            println!("   vendors:         {}", vendors.len());

            let mut tag_counts: HashMap<&str, usize> = HashMap::new();
            for tag in entries.iter().flat_map(|e| e.fields.tags.iter()) {
                *tag_counts.entry(tag.as_str()).or_default() += 1;
            }
            let mut top_tags: Vec<(&str, usize)> = tag_counts.into_iter().collect();
            top_tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            println!("   top tags:");
            for (tag, count) in top_tags.into_iter().take(10) {
                println!("     {:<20} {}", tag, count);
            }
        }
    }
    Ok(())
}
