//! Catalog snapshot loading.
//!
//! A snapshot is the full, read-only set of records searched at a point in
//! time. [`JsonCatalog`] reads one exported JSON file, or every `*.json`
//! file under a directory in path order, and enforces the snapshot
//! invariants: unique handles and non-negative prices.
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::traits::CatalogProvider;
use crate::types::CatalogRecord;

#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    records: Vec<CatalogRecord>,
}

impl CatalogSnapshot {
    /// Build a snapshot from already materialized records, keeping the first
    /// record for each handle and clamping negative prices to zero.
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for mut record in records {
            if !record.handle.is_empty() && !seen.insert(record.handle.clone()) {
                warn!(handle = %record.handle, "duplicate handle in catalog, keeping first record");
                continue;
            }
            clamp_prices(&mut record);
            kept.push(record);
        }
        Self { records: kept }
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CatalogRecord> {
        self.records
    }
}

fn clamp_prices(record: &mut CatalogRecord) {
    if record.price < 0.0 {
        warn!(handle = %record.handle, price = record.price, "negative price clamped to zero");
        record.price = 0.0;
    }
    for variant in &mut record.variants {
        if variant.price < 0.0 {
            warn!(handle = %record.handle, variant = %variant.title, "negative variant price clamped to zero");
            variant.price = 0.0;
        }
    }
}

/// Catalog provider backed by exported JSON on disk.
///
/// Each file holds either an array of records or an object with a
/// `products` array.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn list_json_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        files.sort();
        files
    }

    fn read_file(path: &Path) -> Result<Vec<CatalogRecord>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        parse_records(&content).with_context(|| format!("Failed to parse catalog file {}", path.display()))
    }
}

impl CatalogProvider for JsonCatalog {
    fn load(&self) -> Result<CatalogSnapshot> {
        if !self.path.exists() {
            return Err(crate::error::Error::NotFound(self.path.display().to_string()).into());
        }
        let files = if self.path.is_dir() { self.list_json_files() } else { vec![self.path.clone()] };
        let mut records = Vec::new();
        for file in &files {
            let batch = Self::read_file(file)?;
            debug!(file = %file.display(), records = batch.len(), "read catalog file");
            records.extend(batch);
        }
        let snapshot = CatalogSnapshot::from_records(records);
        info!(path = %self.path.display(), files = files.len(), records = snapshot.len(), "catalog snapshot loaded");
        Ok(snapshot)
    }
}

/// Decode records one by one so a single malformed entry is skipped rather
/// than failing the whole export.
pub fn parse_records(content: &str) -> Result<Vec<CatalogRecord>> {
    let root: Value = serde_json::from_str(content)?;
    let items = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("products") {
            Some(Value::Array(items)) => items,
            _ => return Err(crate::error::Error::Catalog("expected a `products` array".into()).into()),
        },
        _ => return Err(crate::error::Error::Catalog("expected an array of records".into()).into()),
    };
    let mut records = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<CatalogRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!(position, error = %e, "skipping malformed catalog record"),
        }
    }
    Ok(records)
}
