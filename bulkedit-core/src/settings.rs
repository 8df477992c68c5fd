//! Clap-free settings for a sweep.

use bulkedit_types::ids::ProductId;
use bulkedit_types::query::QueryFilters;

/// Settings for one run of the corrector.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    /// Explicit product ids. When non-empty the catalog query is not used.
    pub target_ids: Vec<ProductId>,

    pub filters: QueryFilters,

    /// Decide and report, but never call a mutating port.
    pub dry_run: bool,
}

impl RunSettings {
    /// Target ids in the order given, duplicates dropped.
    pub fn unique_targets(&self) -> Vec<ProductId> {
        let mut seen = std::collections::HashSet::new();
        self.target_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}
