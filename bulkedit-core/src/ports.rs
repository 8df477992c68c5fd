//! Port traits abstracting the catalog away from the sweep.

use bulkedit_types::catalog::{ProductSnapshot, VariationSnapshot};
use bulkedit_types::event::SweepEvent;
use bulkedit_types::ids::{ProductId, TermId};
use bulkedit_types::query::{Cursor, Page, QueryFilters};
use bulkedit_types::spec::CorrectionSpec;
use camino::Utf8Path;
use std::collections::BTreeMap;

/// Paginated product id query.
pub trait CatalogQuery {
    fn page(&self, filters: &QueryFilters, cursor: Cursor) -> anyhow::Result<Page>;
}

/// Product and variation persistence.
///
/// `Ok(None)` from a load means the entity does not exist.
pub trait ProductStore {
    fn load_product(&self, id: ProductId) -> anyhow::Result<Option<ProductSnapshot>>;

    fn load_variation(&self, id: ProductId) -> anyhow::Result<Option<VariationSnapshot>>;

    fn save_variation_attributes(
        &self,
        id: ProductId,
        attributes: &BTreeMap<String, String>,
    ) -> anyhow::Result<()>;

    /// Drop cached aggregates for a product after its terms changed.
    fn invalidate_caches(&self, id: ProductId) -> anyhow::Result<()>;

    /// Called once before the first product is visited.
    fn begin_bulk(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once after the sweep, including interrupted sweeps.
    fn end_bulk(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Taxonomy term lookup and assignment.
pub trait TermStore {
    fn resolve(&self, taxonomy: &str, slug: &str) -> anyhow::Result<Option<TermId>>;

    fn assigned(&self, product: ProductId, taxonomy: &str) -> anyhow::Result<Vec<TermId>>;

    /// Replace the product's assignment for `taxonomy` with `terms`.
    fn assign(&self, product: ProductId, taxonomy: &str, terms: &[TermId]) -> anyhow::Result<()>;
}

/// Source of correction specs.
pub trait SpecProvider {
    fn specs(&self) -> anyhow::Result<Vec<CorrectionSpec>>;
}

/// Receives progress events in sweep order.
pub trait EventSink {
    fn on_event(&self, event: &SweepEvent);
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}

/// The three catalog capabilities the sweep needs.
#[derive(Clone, Copy)]
pub struct CatalogPorts<'a> {
    pub query: &'a dyn CatalogQuery,
    pub products: &'a dyn ProductStore,
    pub terms: &'a dyn TermStore,
}

impl<'a> CatalogPorts<'a> {
    /// Use one backend for all three capabilities.
    pub fn from_backend<B>(backend: &'a B) -> Self
    where
        B: CatalogQuery + ProductStore + TermStore,
    {
        Self {
            query: backend,
            products: backend,
            terms: backend,
        }
    }
}
