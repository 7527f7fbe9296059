use crate::catalog::CatalogSnapshot;

/// Source of catalog snapshots, e.g. a periodic storefront export.
pub trait CatalogProvider: Send + Sync {
    fn load(&self) -> anyhow::Result<CatalogSnapshot>;
}
