//! Shared DTOs (schemas-as-code) for the bulkedit workspace.
//!
//! # Design constraints
//! - Report and catalog types are serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod catalog;
pub mod event;
pub mod ids;
pub mod query;
pub mod report;
pub mod spec;

/// Schema identifiers.
pub mod schema {
    pub const BULKEDIT_REPORT_V1: &str = "bulkedit.report.v1";
    pub const BULKEDIT_CATALOG_V1: &str = "bulkedit.catalog.v1";
}
