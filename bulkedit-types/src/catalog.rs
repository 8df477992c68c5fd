use crate::ids::{ProductId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Product type tag as reported by the catalog.
///
/// Only `Variable` products are eligible for correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Simple,
    Variable,
    Grouped,
    External,
    Variation,
    #[serde(other)]
    Other,
}

impl ProductKind {
    pub fn is_variable(self) -> bool {
        matches!(self, ProductKind::Variable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Simple => "simple",
            ProductKind::Variable => "variable",
            ProductKind::Grouped => "grouped",
            ProductKind::External => "external",
            ProductKind::Variation => "variation",
            ProductKind::Other => "other",
        }
    }
}

/// Immutable view of a parent product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub kind: ProductKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,

    /// Visible variation ids, in catalog order.
    #[serde(default)]
    pub children: Vec<ProductId>,
}

/// Immutable view of a variation and its literal attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationSnapshot {
    pub id: ProductId,
    pub parent_id: ProductId,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// A term within an attribute taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Parent product as stored in a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub kind: ProductKind,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,

    /// Assigned term ids keyed by taxonomy.
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<TermId>>,

    /// All variation ids, visible or not.
    #[serde(default)]
    pub children: Vec<ProductId>,
}

/// Serialized catalog: products, variations and the term vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default = "default_catalog_schema")]
    pub schema: String,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default)]
    pub variations: Vec<VariationSnapshot>,

    /// Term vocabulary keyed by taxonomy.
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<Term>>,
}

impl CatalogDocument {
    pub fn new() -> Self {
        Self {
            schema: default_catalog_schema(),
            ..Default::default()
        }
    }

    pub fn product(&self, id: ProductId) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: ProductId) -> Option<&mut ProductRecord> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub fn variation(&self, id: ProductId) -> Option<&VariationSnapshot> {
        self.variations.iter().find(|v| v.id == id)
    }

    pub fn variation_mut(&mut self, id: ProductId) -> Option<&mut VariationSnapshot> {
        self.variations.iter_mut().find(|v| v.id == id)
    }

    /// Look up a term by slug within a taxonomy.
    pub fn term_by_slug(&self, taxonomy: &str, slug: &str) -> Option<&Term> {
        self.terms.get(taxonomy)?.iter().find(|t| t.slug == slug)
    }
}

fn default_true() -> bool {
    true
}

fn default_status() -> String {
    "publish".to_string()
}

fn default_catalog_schema() -> String {
    crate::schema::BULKEDIT_CATALOG_V1.to_string()
}
