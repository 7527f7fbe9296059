//! Domain types shared by the search engine and its callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Handle = String;
pub type Meta = BTreeMap<String, String>;

/// Currency assumed when neither the record nor its variant names one.
pub const DEFAULT_CURRENCY: &str = "INR";

const META_VENDOR_KEYS: &[&str] = &["vendor"];
const META_COMPARE_AT_KEYS: &[&str] = &["compareatprice", "compare_at_price"];

/// Metadata keys that are bookkeeping, not descriptive text.
const IGNORED_META_KEYS: &[&str] = &["compareatprice", "compare_at_price", "weight", "vendor"];

/// One purchasable variant of a record (e.g. "Paperback", "Hardcover").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variant {
    #[serde(deserialize_with = "de::string")]
    pub title: String,
    #[serde(deserialize_with = "de::amount")]
    pub price: f64,
    #[serde(alias = "compareAtPrice", deserialize_with = "de::optional_amount")]
    pub compare_at_price: Option<f64>,
    #[serde(alias = "currencyCode", deserialize_with = "de::optional_string")]
    pub currency: Option<String>,
}

/// One catalog entry.
///
/// Every field has a default so that partially exported records still load:
/// a missing title is an empty string and simply never matches.
///
/// - `handle`: URL-safe slug, unique within a snapshot
/// - `vendor`: publisher, or the author when no author is named elsewhere
/// - `byline`: top-level `author` key written by CSV exports
/// - `metadata`: semantic key/value pairs; see [`MetaSlot`] for the keys the
///   scorer understands
/// - `variants`: optional purchasable variants; when present they take
///   precedence over the record-level price
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogRecord {
    #[serde(deserialize_with = "de::string")]
    pub title: String,
    #[serde(deserialize_with = "de::string")]
    pub handle: Handle,
    #[serde(deserialize_with = "de::string")]
    pub vendor: String,
    #[serde(rename = "author", deserialize_with = "de::string", skip_serializing_if = "String::is_empty")]
    pub byline: String,
    #[serde(alias = "productType", alias = "type", deserialize_with = "de::string")]
    pub product_type: String,
    #[serde(deserialize_with = "de::tags")]
    pub tags: Vec<String>,
    #[serde(alias = "body", deserialize_with = "de::string")]
    pub description: String,
    #[serde(alias = "priceCurrent", deserialize_with = "de::amount")]
    pub price: f64,
    #[serde(
        alias = "compareAtPrice",
        alias = "priceCompareAt",
        deserialize_with = "de::optional_amount"
    )]
    pub compare_at_price: Option<f64>,
    #[serde(alias = "currencyCode", deserialize_with = "de::optional_string")]
    pub currency: Option<String>,
    #[serde(alias = "imageUrl", alias = "image", deserialize_with = "de::optional_string")]
    pub image_url: Option<String>,
    #[serde(alias = "altText", deserialize_with = "de::optional_string")]
    pub image_alt: Option<String>,
    #[serde(alias = "metafields", deserialize_with = "de::metadata")]
    pub metadata: Meta,
    pub variants: Vec<Variant>,
}

/// Semantic metadata slots with their own weight in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaSlot {
    Author,
    Isbn,
    Language,
    ReadersCategory,
    AuthorLocation,
}

impl MetaSlot {
    pub const ALL: [MetaSlot; 5] = [
        MetaSlot::Author,
        MetaSlot::Isbn,
        MetaSlot::Language,
        MetaSlot::ReadersCategory,
        MetaSlot::AuthorLocation,
    ];

    /// Canonical key spellings accepted for this slot.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            MetaSlot::Author => &["author", "authors", "author01"],
            MetaSlot::Isbn => &["isbn", "isbn_13", "isbn13", "isbn_10", "isbn10"],
            MetaSlot::Language => &["language", "book_language"],
            MetaSlot::ReadersCategory => &["readers_category", "reader_category"],
            MetaSlot::AuthorLocation => &["author_location", "author_origin"],
        }
    }

    pub fn matches(self, key: &str) -> bool {
        let key = canonical_key(key);
        self.aliases().contains(&key.as_str())
    }

    pub fn of_key(key: &str) -> Option<MetaSlot> {
        Self::ALL.into_iter().find(|slot| slot.matches(key))
    }
}

/// Lowercase a metadata key and fold spaces and hyphens to `_`.
pub fn canonical_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

impl CatalogRecord {
    /// First non-blank metadata value stored under any alias of `slot`.
    pub fn meta(&self, slot: MetaSlot) -> Option<&str> {
        self.meta_value(slot.aliases())
    }

    fn meta_value(&self, keys: &[&str]) -> Option<&str> {
        self.metadata
            .iter()
            .filter(|(k, _)| keys.contains(&canonical_key(k).as_str()))
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    /// Metadata values that belong to no [`MetaSlot`] (subcategory, keywords, ...).
    pub fn misc_metadata(&self) -> impl Iterator<Item = &str> {
        self.metadata
            .iter()
            .filter(|(k, _)| {
                MetaSlot::of_key(k).is_none() && !IGNORED_META_KEYS.contains(&canonical_key(k).as_str())
            })
            .map(|(_, v)| v.as_str())
    }

    /// The vendor, else `metafields.vendor`.
    pub fn publisher(&self) -> &str {
        match self.vendor.trim() {
            "" => self.meta_value(META_VENDOR_KEYS).unwrap_or(""),
            vendor => vendor,
        }
    }

    fn named_author(&self) -> Option<&str> {
        self.meta(MetaSlot::Author)
            .or_else(|| Some(self.byline.trim()).filter(|b| !b.is_empty()))
    }

    /// True when an author is given by metadata or the top-level byline.
    pub fn has_named_author(&self) -> bool {
        self.named_author().is_some()
    }

    /// Author for display and scoring: the author metadata, then the byline,
    /// then the publisher.
    pub fn author(&self) -> &str {
        self.named_author().unwrap_or_else(|| self.publisher())
    }

    /// Record-level "was" price, else `metafields.compareAtPrice`.
    fn compare_at(&self) -> Option<f64> {
        self.compare_at_price.or_else(|| {
            self.meta_value(META_COMPARE_AT_KEYS)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|a| *a > 0.0)
        })
    }

    /// The paperback variant if one exists, else the first variant.
    pub fn preferred_variant(&self) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| v.title.to_lowercase().contains("paperback"))
            .or_else(|| self.variants.first())
    }

    /// Effective price of the preferred variant, falling back to the
    /// record-level price when there are no variants.
    pub fn pricing(&self) -> Pricing {
        let record_currency = self.currency.as_deref();
        match self.preferred_variant() {
            Some(v) => Pricing::new(
                v.price,
                v.compare_at_price,
                v.currency.as_deref().or(record_currency),
            ),
            None => Pricing::new(self.price, self.compare_at(), record_currency),
        }
    }
}

/// Effective price and discount of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub amount: f64,
    pub compare_at: Option<f64>,
    pub currency: String,
    /// `round((compare_at - amount) / compare_at * 100)`, only when
    /// `compare_at > amount`.
    pub discount_percent: Option<u32>,
}

impl Pricing {
    pub fn new(amount: f64, compare_at: Option<f64>, currency: Option<&str>) -> Self {
        let amount = amount.max(0.0);
        let discount_percent = compare_at
            .filter(|c| *c > amount)
            .map(|c| (((c - amount) / c) * 100.0).round().clamp(0.0, 100.0) as u32);
        Self {
            amount,
            compare_at,
            currency: currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(DEFAULT_CURRENCY)
                .to_string(),
            discount_percent,
        }
    }

    pub fn discount_label(&self) -> Option<String> {
        self.discount_percent.map(|d| format!("{}% off", d))
    }
}

/// Presentation-ready view of one ranked record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub handle: Handle,
    pub title: String,
    pub author: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    pub currency: String,
    pub image: String,
    pub alt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub tags: Vec<String>,
    pub score: u32,
}

impl ProductCard {
    pub fn new(record: &CatalogRecord, pricing: &Pricing, score: u32, link_prefix: Option<&str>) -> Self {
        Self {
            handle: record.handle.clone(),
            title: record.title.clone(),
            author: record.author().to_string(),
            price: pricing.amount,
            compare_at: pricing.compare_at.filter(|c| *c > pricing.amount),
            discount: pricing.discount_label(),
            currency: pricing.currency.clone(),
            image: record.image_url.clone().unwrap_or_default(),
            alt_text: record.image_alt.clone().unwrap_or_else(|| record.title.clone()),
            link: link_prefix.map(|prefix| format!("{}{}", prefix, record.handle)),
            tags: record.tags.clone(),
            score,
        }
    }
}

/// Wire shape of a search reply. On the no-match path `products` is empty,
/// `no_match` is set and `text` carries a fallback message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub products: Vec<ProductCard>,
    #[serde(default)]
    pub no_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Lenient field decoders for storefront exports, where prices arrive as
/// strings, tags as comma-separated text and metafields as loose JSON.
mod de {
    use super::Meta;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_to_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Option::<Value>::deserialize(d)?
            .and_then(scalar_to_string)
            .unwrap_or_default())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?
            .and_then(scalar_to_string)
            .filter(|s| !s.trim().is_empty()))
    }

    fn parse_amount<E: serde::de::Error>(value: Option<Value>) -> Result<Option<f64>, E> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid amount {:?}", s))),
            Some(other) => Err(E::custom(format!("invalid amount {}", other))),
        }
    }

    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(parse_amount::<D::Error>(Option::<Value>::deserialize(d)?)?.unwrap_or(0.0))
    }

    /// A zero or negative "was" price means there is none.
    pub fn optional_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(parse_amount::<D::Error>(Option::<Value>::deserialize(d)?)?.filter(|a| *a > 0.0))
    }

    pub fn tags<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let raw: Vec<String> = match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
            Some(Value::Array(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
            Some(other) => return Err(D::Error::custom(format!("invalid tags {}", other))),
        };
        Ok(raw
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// Scalars are stringified; nested objects and arrays are dropped.
    pub fn metadata<'de, D: Deserializer<'de>>(d: D) -> Result<Meta, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(Meta::new()),
            Some(Value::Object(map)) => Ok(map
                .into_iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
                .collect()),
            Some(other) => Err(D::Error::custom(format!("invalid metadata {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_meta(pairs: &[(&str, &str)]) -> CatalogRecord {
        CatalogRecord {
            metadata: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..CatalogRecord::default()
        }
    }

    #[test]
    fn meta_slots_accept_export_spellings() {
        let r = record_with_meta(&[
            ("Authors", "Swami Sivananda"),
            ("isbn 13", "9788120835603"),
            ("Book Language", "Hindi"),
            ("readers-category", "Adults"),
            ("author location", "Rishikesh"),
            ("subcategory", "Yoga"),
        ]);
        assert_eq!(r.meta(MetaSlot::Author), Some("Swami Sivananda"));
        assert_eq!(r.meta(MetaSlot::Isbn), Some("9788120835603"));
        assert_eq!(r.meta(MetaSlot::Language), Some("Hindi"));
        assert_eq!(r.meta(MetaSlot::ReadersCategory), Some("Adults"));
        assert_eq!(r.meta(MetaSlot::AuthorLocation), Some("Rishikesh"));
        assert_eq!(r.misc_metadata().collect::<Vec<_>>(), vec!["Yoga"]);
    }

    #[test]
    fn author_falls_back_to_vendor() {
        let mut r = CatalogRecord { vendor: "Motilal Banarsidass".into(), ..CatalogRecord::default() };
        assert_eq!(r.author(), "Motilal Banarsidass");
        assert!(!r.has_named_author());
        r.metadata.insert("author".into(), "   ".into());
        assert_eq!(r.author(), "Motilal Banarsidass", "blank author metadata is ignored");
        r.metadata.insert("author".into(), "David Frawley".into());
        assert_eq!(r.author(), "David Frawley");
    }

    #[test]
    fn byline_and_metafield_vendor_fill_missing_author() {
        let mut r = CatalogRecord { byline: " Osho ".into(), ..CatalogRecord::default() };
        r.metadata.insert("vendor".into(), "Osho Media".into());
        assert_eq!(r.author(), "Osho");
        assert_eq!(r.publisher(), "Osho Media");
        assert!(r.has_named_author());

        r.byline.clear();
        assert_eq!(r.author(), "Osho Media");
        assert!(!r.has_named_author());

        r.metadata.insert("Author".into(), "Swami Anand".into());
        assert_eq!(r.author(), "Swami Anand", "author metadata wins over the byline");
    }

    #[test]
    fn metafield_compare_at_backs_up_record_price() {
        let mut r = CatalogRecord { price: 300.0, ..CatalogRecord::default() };
        r.metadata.insert("compareAtPrice".into(), "400".into());
        assert_eq!(r.pricing().compare_at, Some(400.0));
        assert_eq!(r.pricing().discount_percent, Some(25));

        r.compare_at_price = Some(600.0);
        assert_eq!(r.pricing().discount_percent, Some(50));

        r.compare_at_price = None;
        r.metadata.insert("compareAtPrice".into(), "".into());
        assert_eq!(r.pricing().compare_at, None);
    }

    #[test]
    fn paperback_variant_is_preferred() {
        let r = CatalogRecord {
            price: 999.0,
            variants: vec![
                Variant { title: "Hardcover".into(), price: 650.0, ..Variant::default() },
                Variant { title: "Paperback".into(), price: 350.0, compare_at_price: Some(500.0), ..Variant::default() },
            ],
            ..CatalogRecord::default()
        };
        let p = r.pricing();
        assert_eq!(p.amount, 350.0);
        assert_eq!(p.discount_percent, Some(30));
        assert_eq!(p.discount_label().as_deref(), Some("30% off"));
        assert_eq!(p.currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn first_variant_then_record_price() {
        let with_variants = CatalogRecord {
            price: 999.0,
            variants: vec![
                Variant { title: "Hardcover".into(), price: 650.0, ..Variant::default() },
                Variant { title: "Ebook".into(), price: 150.0, ..Variant::default() },
            ],
            ..CatalogRecord::default()
        };
        assert_eq!(with_variants.pricing().amount, 650.0);

        let flat = CatalogRecord { price: 240.0, currency: Some("USD".into()), ..CatalogRecord::default() };
        let p = flat.pricing();
        assert_eq!(p.amount, 240.0);
        assert_eq!(p.currency, "USD");
        assert_eq!(p.discount_percent, None);
    }

    #[test]
    fn no_discount_unless_compare_at_exceeds_price() {
        assert_eq!(Pricing::new(300.0, Some(300.0), None).discount_percent, None);
        assert_eq!(Pricing::new(300.0, Some(200.0), None).discount_percent, None);
        assert_eq!(Pricing::new(299.0, Some(399.0), None).discount_percent, Some(25));
    }

    #[test]
    fn lenient_decoding_of_export_rows() {
        let json = r#"{
            "title": "Light on Yoga",
            "handle": "light-on-yoga",
            "vendor": null,
            "type": "Books",
            "tags": "yoga, asana , ,health",
            "price": "449.00",
            "compareAtPrice": "",
            "image": "https://cdn.example/light.jpg",
            "metafields": { "isbn": 8172235011, "options": { "option1": "Paperback" } },
            "variants": [ { "title": "Paperback", "price": 399, "compareAtPrice": "499.00" } ]
        }"#;
        let r: CatalogRecord = serde_json::from_str(json).expect("decode");
        assert_eq!(r.vendor, "");
        assert_eq!(r.product_type, "Books");
        assert_eq!(r.tags, vec!["yoga", "asana", "health"]);
        assert_eq!(r.price, 449.0);
        assert_eq!(r.compare_at_price, None);
        assert_eq!(r.image_url.as_deref(), Some("https://cdn.example/light.jpg"));
        assert_eq!(r.meta(MetaSlot::Isbn), Some("8172235011"));
        assert!(!r.metadata.contains_key("options"));
        assert_eq!(r.pricing().discount_percent, Some(20));
    }

    #[test]
    fn bad_amount_is_a_decode_error() {
        let res: Result<CatalogRecord, _> = serde_json::from_str(r#"{"title":"x","price":"free"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn product_card_uses_title_as_alt_text_and_builds_link() {
        let r = CatalogRecord {
            title: "Ayurveda and the Mind".into(),
            handle: "ayurveda-and-the-mind".into(),
            vendor: "Lotus Press".into(),
            ..CatalogRecord::default()
        };
        let card = ProductCard::new(&r, &Pricing::new(320.0, Some(400.0), None), 120, Some("https://shop.example/products/"));
        assert_eq!(card.alt_text, "Ayurveda and the Mind");
        assert_eq!(card.link.as_deref(), Some("https://shop.example/products/ayurveda-and-the-mind"));
        assert_eq!(card.discount.as_deref(), Some("20% off"));

        let json = serde_json::to_value(&card).expect("serialize");
        assert!(json.get("altText").is_some());
        assert!(json.get("compareAt").is_some());
    }
}
