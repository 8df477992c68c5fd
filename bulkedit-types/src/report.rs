use crate::ids::ProductId;
use crate::spec::CorrectionSpec;
use serde::{Deserialize, Serialize};

/// Outcome of one sweep, serialized as `report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub schema: String,
    pub tool: ReportToolInfo,
    pub run: ReportRunInfo,
    pub dry_run: bool,

    /// True when the sweep stopped before visiting every product.
    #[serde(default)]
    pub interrupted: bool,

    #[serde(default)]
    pub specs: Vec<CorrectionSpec>,

    pub counts: ReportCounts,

    #[serde(default)]
    pub entries: Vec<ReportEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ExecutionReport {
    pub fn new(tool: ReportToolInfo, run: ReportRunInfo, dry_run: bool) -> Self {
        Self {
            schema: crate::schema::BULKEDIT_REPORT_V1.to_string(),
            tool,
            run,
            dry_run,
            interrupted: false,
            specs: vec![],
            counts: ReportCounts::default(),
            entries: vec![],
            failures: vec![],
            data: None,
        }
    }

    /// Record an entry and bump the matching counter.
    pub fn record_entry(&mut self, entry: ReportEntry) {
        match (entry.target, entry.status) {
            (EntryTarget::Parent, EntryStatus::Applied | EntryStatus::Planned) => {
                self.counts.parent_corrections += 1
            }
            (EntryTarget::Variation, EntryStatus::Applied | EntryStatus::Planned) => {
                self.counts.variation_corrections += 1
            }
            (EntryTarget::Variation, EntryStatus::Unchanged) => {
                self.counts.variations_unchanged += 1
            }
            _ => {}
        }
        self.entries.push(entry);
    }

    /// Record a per-item failure and bump the matching counter.
    pub fn record_failure(&mut self, failure: ItemFailure) {
        match failure.stage {
            FailureStage::Load => self.counts.load_failures += 1,
            FailureStage::TermResolution => self.counts.resolution_errors += 1,
            FailureStage::Persistence => self.counts.persistence_failures += 1,
            FailureStage::Query => {}
        }
        self.failures.push(failure);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRunInfo {
    pub run_id: String,
    pub started_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    /// Every product id the sweep reached, including skipped ones.
    pub products_visited: u64,

    /// Products left alone: not `variable`, or not loadable.
    pub products_skipped: u64,

    /// Products or variations that could not be loaded.
    pub load_failures: u64,

    pub parent_corrections: u64,
    pub variation_corrections: u64,

    /// Variations whose value did not match the old value.
    pub variations_unchanged: u64,

    pub resolution_errors: u64,
    pub persistence_failures: u64,
}

/// Which entity an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTarget {
    Parent,
    Variation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// The write was issued and accepted.
    Applied,
    /// Dry-run: the write would have been issued.
    Planned,
    /// Nothing to change.
    Unchanged,
    /// The write was rejected.
    Failed,
}

/// One decision made by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub product_id: ProductId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<ProductId>,

    pub target: EntryTarget,
    pub attribute_key: String,

    /// Value before the decision: the old value for parents, the stored value for variations.
    pub from: String,
    pub to: String,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Load,
    TermResolution,
    Persistence,
    Query,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Load => "load",
            FailureStage::TermResolution => "term_resolution",
            FailureStage::Persistence => "persistence",
            FailureStage::Query => "query",
        }
    }
}

/// A per-item error that was caught and did not stop the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<ProductId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_key: Option<String>,

    pub stage: FailureStage,
    pub message: String,
}
