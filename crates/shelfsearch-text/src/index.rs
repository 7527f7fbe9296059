use std::collections::HashSet;

use shelfsearch_core::catalog::CatalogSnapshot;
use shelfsearch_core::types::{CatalogRecord, MetaSlot, Pricing};
use tracing::debug;

use crate::normalize::{digits_only, normalize, strip_markup};

/// Normalized text of every scored field of one record.
///
/// `vendor` holds the publisher only when it differs from the author, so the
/// same name is never scored twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedFields {
    pub title: String,
    pub author: String,
    pub readers_category: String,
    pub isbn: String,
    pub author_location: String,
    pub vendor: String,
    pub language: String,
    pub tags: Vec<String>,
    pub description: String,
    pub misc: Vec<String>,
}

impl NormalizedFields {
    pub fn from_record(record: &CatalogRecord) -> Self {
        let meta = |slot| record.meta(slot).map(normalize).unwrap_or_default();
        let mut seen = HashSet::new();
        let misc: Vec<String> = std::iter::once(record.product_type.as_str())
            .chain(record.misc_metadata())
            .map(normalize)
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        let author = normalize(record.author());
        let publisher = normalize(record.publisher());
        Self {
            title: normalize(&record.title),
            vendor: if publisher == author { String::new() } else { publisher },
            author,
            readers_category: meta(MetaSlot::ReadersCategory),
            isbn: record.meta(MetaSlot::Isbn).map(digits_only).unwrap_or_default(),
            author_location: meta(MetaSlot::AuthorLocation),
            language: meta(MetaSlot::Language),
            tags: record.tags.iter().map(|t| normalize(t)).filter(|t| !t.is_empty()).collect(),
            description: normalize(&strip_markup(&record.description)),
            misc,
        }
    }
}

/// One record with its precomputed fields and effective price.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub record: CatalogRecord,
    pub fields: NormalizedFields,
    pub pricing: Pricing,
}

/// Immutable, search-ready form of a catalog snapshot. Built once per
/// snapshot and shared by all concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<IndexedRecord>,
}

impl CatalogIndex {
    pub fn build(snapshot: CatalogSnapshot) -> Self {
        Self::from_records(snapshot.into_records())
    }

    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        let entries: Vec<IndexedRecord> = records
            .into_iter()
            .map(|record| IndexedRecord {
                fields: NormalizedFields::from_record(&record),
                pricing: record.pricing(),
                record,
            })
            .collect();
        debug!(records = entries.len(), "catalog index built");
        Self { entries }
    }

    pub fn entries(&self) -> &[IndexedRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, handle: &str) -> Option<&IndexedRecord> {
        self.entries.iter().find(|e| e.record.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_normalized_once() {
        let mut record = CatalogRecord {
            title: "Yoga: The Path!".into(),
            vendor: "Motilal Banarsidass".into(),
            product_type: "Books".into(),
            tags: vec!["Yoga".into(), "  ".into(), "Hatha-Yoga".into()],
            description: "<p>A <b>classic</b>&amp;timeless text</p>".into(),
            ..CatalogRecord::default()
        };
        record.metadata.insert("Authors".into(), "B.K.S. Iyengar".into());
        record.metadata.insert("ISBN 13".into(), "978-81-208-3560-3".into());
        record.metadata.insert("subcategory".into(), "Hatha Yoga".into());

        let f = NormalizedFields::from_record(&record);
        assert_eq!(f.title, "yoga the path");
        assert_eq!(f.author, "b k s iyengar");
        assert_eq!(f.vendor, "motilal banarsidass");
        assert_eq!(f.isbn, "9788120835603");
        assert_eq!(f.tags, vec!["yoga", "hatha yoga"]);
        assert_eq!(f.description, "a classic timeless text");
        assert_eq!(f.misc, vec!["books", "hatha yoga"]);
    }

    #[test]
    fn vendor_doubles_as_author_without_metadata() {
        let record = CatalogRecord { vendor: "Osho".into(), ..CatalogRecord::default() };
        let f = NormalizedFields::from_record(&record);
        assert_eq!(f.author, "osho");
        assert_eq!(f.vendor, "");
    }

    #[test]
    fn byline_author_is_not_repeated_as_vendor() {
        let mut record = CatalogRecord { byline: "Osho".into(), ..CatalogRecord::default() };
        record.metadata.insert("vendor".into(), "Osho".into());
        let f = NormalizedFields::from_record(&record);
        assert_eq!(f.author, "osho");
        assert_eq!(f.vendor, "");
    }

    #[test]
    fn misc_values_are_unique() {
        let mut record = CatalogRecord { product_type: "Books".into(), ..CatalogRecord::default() };
        record.metadata.insert("keywords".into(), "Yoga".into());
        record.metadata.insert("subcategory".into(), "BOOKS".into());
        let f = NormalizedFields::from_record(&record);
        assert_eq!(f.misc, vec!["books", "yoga"]);
    }

    #[test]
    fn empty_record_has_empty_fields() {
        assert_eq!(NormalizedFields::from_record(&CatalogRecord::default()), NormalizedFields::default());
    }

    #[test]
    fn index_keeps_catalog_order_and_pricing() {
        let index = CatalogIndex::from_records(vec![
            CatalogRecord { handle: "a".into(), price: 10.0, ..CatalogRecord::default() },
            CatalogRecord { handle: "b".into(), price: 20.0, ..CatalogRecord::default() },
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[1].record.handle, "b");
        assert_eq!(index.get("a").map(|e| e.pricing.amount), Some(10.0));
        assert!(index.get("zzz").is_none());
    }
}
