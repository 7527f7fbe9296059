use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("SHELF_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Configuration from an inline TOML document, without files or env.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let config = Self { figment: Figment::new().merge(Toml::string(toml)) };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The `[search]` section over built-in defaults, with `[synonyms]`
    /// folded in.
    pub fn search_settings(&self) -> anyhow::Result<SearchSettings> {
        let mut settings = match self.figment.find_value("search") {
            Ok(_) => self.get::<SearchSettings>("search")?,
            Err(_) => SearchSettings::default(),
        };
        if let Ok(synonyms) = self.get::<BTreeMap<String, Vec<String>>>("synonyms") {
            settings.synonyms.extend(synonyms);
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Catalog location from `catalog.path`, expanded and resolved against
    /// the working directory.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        let raw: String = self.get("catalog.path").ok()?;
        let cwd = env::current_dir().unwrap_or_default();
        Some(resolve_with_base(&cwd, raw))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.figment.find_value("search").is_ok() {
            self.search_settings()?;
        }
        Ok(())
    }
}

/// Field weights of the relevance table. Higher means the field is a more
/// reliable relevance signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub title: u32,
    pub author: u32,
    pub readers_category: u32,
    pub isbn: u32,
    pub author_location: u32,
    pub vendor: u32,
    pub language: u32,
    pub tags: u32,
    pub description: u32,
    pub misc: u32,
    pub fuzzy_prefix: u32,
    pub token_coverage: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: 100,
            author: 80,
            readers_category: 70,
            isbn: 65,
            author_location: 60,
            vendor: 50,
            language: 50,
            tags: 40,
            description: 20,
            misc: 10,
            fuzzy_prefix: 15,
            token_coverage: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Queries with fewer non-space normalized characters are rejected.
    pub min_query_chars: usize,
    pub fuzzy_prefix_len: usize,
    /// Tokens ignored for field matching.
    pub stop_words: Vec<String>,
    /// Prepended to a record handle to form the product link.
    pub product_url_prefix: Option<String>,
    pub no_match_message: String,
    /// `{price}` is replaced with the active price ceiling.
    pub no_match_under_price_message: String,
    pub weights: Weights,
    /// Extra colloquial terms merged over the built-in synonym map.
    pub synonyms: BTreeMap<String, Vec<String>>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 8,
            max_limit: 50,
            min_query_chars: 2,
            fuzzy_prefix_len: 4,
            stop_words: ["a", "an", "and", "the", "of", "by", "for", "in", "on", "to", "with", "me", "show"]
                .into_iter()
                .map(String::from)
                .collect(),
            product_url_prefix: None,
            no_match_message: "No products found. Please try a different title, author or ISBN.".to_string(),
            no_match_under_price_message: "Couldn't find books under ₹{price}. Try a higher budget or browse the full catalog."
                .to_string(),
            weights: Weights::default(),
            synonyms: BTreeMap::new(),
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.default_limit == 0 {
            return Err(Error::InvalidConfig("search.default_limit must be at least 1".into()));
        }
        if self.default_limit > self.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        if self.min_query_chars == 0 {
            return Err(Error::InvalidConfig("search.min_query_chars must be at least 1".into()));
        }
        if self.fuzzy_prefix_len == 0 {
            return Err(Error::InvalidConfig("search.fuzzy_prefix_len must be at least 1".into()));
        }
        Ok(())
    }

    /// Requested limit, or the default, capped at `max_limit`.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }

    pub fn no_match_text(&self, price_ceiling: Option<u64>) -> String {
        match price_ceiling {
            Some(price) => self.no_match_under_price_message.replace("{price}", &price.to_string()),
            None => self.no_match_message.clone(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_relevance_table() {
        let w = Weights::default();
        assert!(w.title > w.author && w.author > w.readers_category);
        assert!(w.readers_category > w.isbn && w.isbn > w.author_location);
        assert!(w.tags > w.description && w.description > w.misc);
        assert!(SearchSettings::default().validate().is_ok());
    }

    #[test]
    fn search_section_overrides_defaults() {
        let config = Config::from_toml_str(
            r#"
            [search]
            default_limit = 6
            fuzzy_prefix_len = 5
            [search.weights]
            tags = 45
            [synonyms]
            granth = ["scripture"]
            "#,
        )
        .expect("config");
        let settings = config.search_settings().expect("settings");
        assert_eq!(settings.default_limit, 6);
        assert_eq!(settings.fuzzy_prefix_len, 5);
        assert_eq!(settings.weights.tags, 45);
        assert_eq!(settings.weights.title, 100, "unset weights keep defaults");
        assert_eq!(settings.synonyms.get("granth"), Some(&vec!["scripture".to_string()]));
    }

    #[test]
    fn missing_search_section_yields_defaults() {
        let config = Config::from_toml_str("[catalog]\npath = \"catalog.json\"\n").expect("config");
        assert_eq!(config.search_settings().expect("settings"), SearchSettings::default());
    }

    #[test]
    fn inconsistent_limits_are_rejected() {
        let res = Config::from_toml_str("[search]\ndefault_limit = 80\nmax_limit = 10\n");
        assert!(res.is_err());

        let settings = SearchSettings { fuzzy_prefix_len: 0, ..SearchSettings::default() };
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn limit_is_capped() {
        let settings = SearchSettings::default();
        assert_eq!(settings.effective_limit(None), 8);
        assert_eq!(settings.effective_limit(Some(3)), 3);
        assert_eq!(settings.effective_limit(Some(10_000)), 50);
    }

    #[test]
    fn no_match_text_mentions_ceiling() {
        let settings = SearchSettings::default();
        assert!(settings.no_match_text(Some(300)).contains("₹300"));
        assert_eq!(settings.no_match_text(None), settings.no_match_message);
    }
}
