//! Default port implementations.

use crate::ports::{CatalogQuery, EventSink, ProductStore, SpecProvider, TermStore, WritePort};
use anyhow::{Context, bail};
use bulkedit_types::catalog::{CatalogDocument, ProductSnapshot, VariationSnapshot};
use bulkedit_types::event::SweepEvent;
use bulkedit_types::ids::{ProductId, TermId};
use bulkedit_types::query::{Cursor, Page, QueryFilters};
use bulkedit_types::spec::CorrectionSpec;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Status filter value that matches every product.
const ANY_STATUS: &str = "any";

#[derive(Debug, Default)]
struct CatalogState {
    doc: CatalogDocument,
    dirty: bool,
    invalidated: Vec<ProductId>,
}

/// In-memory catalog for embedding and testing.
///
/// Serves all three catalog ports over one [`CatalogDocument`]. Query results are ordered
/// by product id; pass-through filters must name a taxonomy of the document and match by
/// term slug.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new(doc: CatalogDocument) -> Self {
        Self {
            state: Mutex::new(CatalogState {
                doc,
                ..Default::default()
            }),
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let doc: CatalogDocument = serde_json::from_str(json).context("parse catalog json")?;
        Ok(Self::new(doc))
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> CatalogDocument {
        self.guard().doc.clone()
    }

    /// sha256 of the canonical JSON form of the document.
    pub fn fingerprint(&self) -> anyhow::Result<String> {
        let bytes = serde_json::to_vec(&self.guard().doc).context("serialize catalog")?;
        Ok(sha256_hex(&bytes))
    }

    /// Product ids whose caches were invalidated, in call order.
    pub fn invalidated(&self) -> Vec<ProductId> {
        self.guard().invalidated.clone()
    }

    /// Whether anything was written since the last call.
    pub fn take_dirty(&self) -> bool {
        std::mem::take(&mut self.guard().dirty)
    }

    fn guard(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CatalogQuery for InMemoryCatalog {
    fn page(&self, filters: &QueryFilters, cursor: Cursor) -> anyhow::Result<Page> {
        let state = self.guard();
        let doc = &state.doc;

        let mut wanted: Vec<(&str, Option<TermId>)> = Vec::new();
        for (key, value) in &filters.filters {
            if !doc.terms.contains_key(key) {
                bail!("unsupported filter '{}'", key);
            }
            wanted.push((key.as_str(), doc.term_by_slug(key, value).map(|t| t.id)));
        }

        let mut ids: Vec<ProductId> = doc
            .products
            .iter()
            .filter(|p| match filters.status.as_deref() {
                None | Some(ANY_STATUS) => true,
                Some(status) => p.status == status,
            })
            .filter(|p| {
                wanted.iter().all(|(taxonomy, term)| match term {
                    Some(term) => p
                        .terms
                        .get(*taxonomy)
                        .is_some_and(|assigned| assigned.contains(term)),
                    None => false,
                })
            })
            .map(|p| p.id)
            .collect();
        ids.sort();

        let total = ids.len() as u64;
        let start = cursor.offset.min(total) as usize;
        let page_ids: Vec<ProductId> = ids
            .into_iter()
            .skip(start)
            .take(filters.page_size as usize)
            .collect();

        let end = start as u64 + page_ids.len() as u64;
        let next = (end < total).then_some(Cursor { offset: end });

        debug!(
            offset = cursor.offset,
            returned = page_ids.len(),
            total,
            hints = ?filters.hints,
            "catalog page"
        );
        Ok(Page { ids: page_ids, next })
    }
}

impl ProductStore for InMemoryCatalog {
    fn load_product(&self, id: ProductId) -> anyhow::Result<Option<ProductSnapshot>> {
        let state = self.guard();
        let doc = &state.doc;
        let Some(record) = doc.product(id) else {
            return Ok(None);
        };

        let children = record
            .children
            .iter()
            .copied()
            .filter(|child| doc.variation(*child).is_some_and(|v| v.visible))
            .collect();

        Ok(Some(ProductSnapshot {
            id: record.id,
            kind: record.kind,
            title: record.title.clone(),
            status: record.status.clone(),
            children,
        }))
    }

    fn load_variation(&self, id: ProductId) -> anyhow::Result<Option<VariationSnapshot>> {
        Ok(self.guard().doc.variation(id).cloned())
    }

    fn save_variation_attributes(
        &self,
        id: ProductId,
        attributes: &BTreeMap<String, String>,
    ) -> anyhow::Result<()> {
        let mut state = self.guard();
        let Some(variation) = state.doc.variation_mut(id) else {
            bail!("variation {} does not exist", id);
        };
        variation.attributes = attributes.clone();
        state.dirty = true;
        Ok(())
    }

    fn invalidate_caches(&self, id: ProductId) -> anyhow::Result<()> {
        let mut state = self.guard();
        if state.doc.product(id).is_none() {
            bail!("product {} does not exist", id);
        }
        state.invalidated.push(id);
        Ok(())
    }
}

impl TermStore for InMemoryCatalog {
    fn resolve(&self, taxonomy: &str, slug: &str) -> anyhow::Result<Option<TermId>> {
        Ok(self.guard().doc.term_by_slug(taxonomy, slug).map(|t| t.id))
    }

    fn assigned(&self, product: ProductId, taxonomy: &str) -> anyhow::Result<Vec<TermId>> {
        let state = self.guard();
        let Some(record) = state.doc.product(product) else {
            bail!("product {} does not exist", product);
        };
        Ok(record.terms.get(taxonomy).cloned().unwrap_or_default())
    }

    fn assign(&self, product: ProductId, taxonomy: &str, terms: &[TermId]) -> anyhow::Result<()> {
        let mut state = self.guard();
        let vocabulary = state.doc.terms.get(taxonomy);
        if let Some(unknown) = terms
            .iter()
            .find(|id| !vocabulary.is_some_and(|v| v.iter().any(|t| t.id == **id)))
        {
            bail!("term {} is not part of {}", unknown, taxonomy);
        }

        let Some(record) = state.doc.product_mut(product) else {
            bail!("product {} does not exist", product);
        };
        record.terms.insert(taxonomy.to_string(), terms.to_vec());
        state.dirty = true;
        Ok(())
    }
}

/// Catalog backed by a JSON file.
///
/// Writes land in memory and are persisted to the file when the bulk session ends, and only
/// if something was written.
#[derive(Debug)]
pub struct FsCatalog {
    path: Utf8PathBuf,
    inner: InMemoryCatalog,
}

impl FsCatalog {
    pub fn open(path: impl Into<Utf8PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read catalog {}", path))?;
        let inner = InMemoryCatalog::from_json(&contents)
            .with_context(|| format!("load catalog {}", path))?;
        debug!(path = %path, "catalog opened");
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.inner
    }

    /// Write the document back, through a temp file in the same directory.
    pub fn persist(&self) -> anyhow::Result<()> {
        let doc = self.inner.snapshot();
        let mut json = serde_json::to_string_pretty(&doc).context("serialize catalog")?;
        json.push('\n');

        let tmp = Utf8PathBuf::from(format!("{}.tmp", self.path));
        fs::write(&tmp, json.as_bytes()).with_context(|| format!("write {}", tmp))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replace {}", self.path))?;
        debug!(path = %self.path, "catalog persisted");
        Ok(())
    }
}

impl CatalogQuery for FsCatalog {
    fn page(&self, filters: &QueryFilters, cursor: Cursor) -> anyhow::Result<Page> {
        self.inner.page(filters, cursor)
    }
}

impl ProductStore for FsCatalog {
    fn load_product(&self, id: ProductId) -> anyhow::Result<Option<ProductSnapshot>> {
        self.inner.load_product(id)
    }

    fn load_variation(&self, id: ProductId) -> anyhow::Result<Option<VariationSnapshot>> {
        self.inner.load_variation(id)
    }

    fn save_variation_attributes(
        &self,
        id: ProductId,
        attributes: &BTreeMap<String, String>,
    ) -> anyhow::Result<()> {
        self.inner.save_variation_attributes(id, attributes)
    }

    fn invalidate_caches(&self, id: ProductId) -> anyhow::Result<()> {
        self.inner.invalidate_caches(id)
    }

    fn end_bulk(&self) -> anyhow::Result<()> {
        if self.inner.take_dirty() {
            self.persist()?;
        }
        Ok(())
    }
}

impl TermStore for FsCatalog {
    fn resolve(&self, taxonomy: &str, slug: &str) -> anyhow::Result<Option<TermId>> {
        self.inner.resolve(taxonomy, slug)
    }

    fn assigned(&self, product: ProductId, taxonomy: &str) -> anyhow::Result<Vec<TermId>> {
        self.inner.assigned(product, taxonomy)
    }

    fn assign(&self, product: ProductId, taxonomy: &str, terms: &[TermId]) -> anyhow::Result<()> {
        self.inner.assign(product, taxonomy, terms)
    }
}

/// Fixed spec list. The default is empty, which makes a run a no-op.
#[derive(Debug, Clone, Default)]
pub struct StaticSpecProvider {
    specs: Vec<CorrectionSpec>,
}

impl StaticSpecProvider {
    pub fn new(specs: Vec<CorrectionSpec>) -> Self {
        Self { specs }
    }
}

impl SpecProvider for StaticSpecProvider {
    fn specs(&self) -> anyhow::Result<Vec<CorrectionSpec>> {
        Ok(self.specs.clone())
    }
}

/// Discards events.
#[derive(Debug, Clone, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: &SweepEvent) {}
}

/// Keeps every event, for embedding and testing.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<SweepEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<SweepEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for CollectingSink {
    fn on_event(&self, event: &SweepEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// sha256 of a file's bytes.
pub fn file_sha256(path: &Utf8Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path))?;
    Ok(sha256_hex(&bytes))
}
