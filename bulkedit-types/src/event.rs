use crate::catalog::ProductKind;
use crate::ids::ProductId;
use crate::report::{ItemFailure, ReportEntry};
use serde::{Deserialize, Serialize};

/// Progress emitted while the sweep runs, in sweep order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SweepEvent {
    ProductVisited { id: ProductId, title: String },
    ProductSkipped { id: ProductId, kind: ProductKind },
    Correction(ReportEntry),
    Failure(ItemFailure),
}
