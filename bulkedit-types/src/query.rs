use crate::ids::ProductId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// The only post type the sweep queries.
pub const PRODUCT_POST_TYPE: &str = "product";

pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Catalog query filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilters {
    pub post_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    pub page_size: u32,
    pub offset: u64,

    /// Pass-through `field=value` filters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,

    #[serde(default)]
    pub hints: QueryHints,
}

impl Default for QueryFilters {
    fn default() -> Self {
        Self {
            post_type: PRODUCT_POST_TYPE.to_string(),
            status: None,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
            filters: BTreeMap::new(),
            hints: QueryHints::default(),
        }
    }
}

impl QueryFilters {
    /// Reject filters no catalog could serve.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.post_type != PRODUCT_POST_TYPE {
            return Err(FilterError::PostType {
                found: self.post_type.clone(),
            });
        }
        if self.page_size == 0 {
            return Err(FilterError::ZeroPageSize);
        }
        if let Some(key) = self.filters.keys().find(|k| k.trim().is_empty()) {
            return Err(FilterError::EmptyKey { key: key.clone() });
        }
        Ok(())
    }

    /// Move caching hints passed as pass-through filters into `hints`.
    ///
    /// Hint keys use the catalog's query argument names (`update_post_term_cache`,
    /// `update_post_meta_cache`, `ignore_sticky_posts`, `no_found_rows`).
    pub fn extract_hints(&mut self) -> Result<(), FilterError> {
        let keys: Vec<String> = self
            .filters
            .keys()
            .filter(|k| QueryHints::is_hint_key(k))
            .cloned()
            .collect();
        for key in keys {
            if let Some(value) = self.filters.remove(&key) {
                self.hints.set(&key, &value)?;
            }
        }
        Ok(())
    }

    /// Cursor for the first page.
    pub fn first_cursor(&self) -> Cursor {
        Cursor {
            offset: self.offset,
        }
    }
}

/// Filters that no catalog could serve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("post_type must be 'product', got '{found}'")]
    PostType { found: String },

    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("filter key '{key}' is empty")]
    EmptyKey { key: String },

    #[error("query hint '{key}' expects a boolean, got '{value}'")]
    InvalidHint { key: String, value: String },
}

/// Performance hints forwarded to the catalog. They never affect results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryHints {
    pub cache_terms: bool,
    pub cache_meta: bool,
    pub ignore_sticky: bool,
    pub count_found_rows: bool,
}

impl Default for QueryHints {
    fn default() -> Self {
        Self {
            cache_terms: false,
            cache_meta: false,
            ignore_sticky: true,
            count_found_rows: false,
        }
    }
}

impl QueryHints {
    pub const HINT_KEYS: [&'static str; 4] = [
        "update_post_term_cache",
        "update_post_meta_cache",
        "ignore_sticky_posts",
        "no_found_rows",
    ];

    pub fn is_hint_key(key: &str) -> bool {
        Self::HINT_KEYS.contains(&key)
    }

    /// Set one hint from its query argument name. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        let flag = match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => {
                return Err(FilterError::InvalidHint {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        };
        match key {
            "update_post_term_cache" => self.cache_terms = flag,
            "update_post_meta_cache" => self.cache_meta = flag,
            "ignore_sticky_posts" => self.ignore_sticky = flag,
            "no_found_rows" => self.count_found_rows = !flag,
            _ => {}
        }
        Ok(())
    }
}

/// Position in the paginated product query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub offset: u64,
}

/// One page of product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub ids: Vec<ProductId>,

    /// `None` when the query is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Cursor>,
}
