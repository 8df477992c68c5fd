//! Embeddable core library for bulkedit.
//!
//! Provides a clap-free, I/O-abstracted sweep that renames attribute values on variable
//! products and their variations.
//!
//! # Port traits
//!
//! All catalog access is abstracted behind port traits in [`ports`]:
//! - [`CatalogQuery`](ports::CatalogQuery): paginated product id query
//! - [`ProductStore`](ports::ProductStore): load products/variations, save variations
//! - [`TermStore`](ports::TermStore): resolve and assign taxonomy terms
//! - [`SpecProvider`](ports::SpecProvider): the correction list, injected at construction
//! - [`EventSink`](ports::EventSink): progress events
//!
//! The [`adapters`] module provides in-memory and JSON-file backed implementations.
//!
//! # Entry points
//!
//! - [`BulkAttributeCorrector::run`](corrector::BulkAttributeCorrector::run)
//! - [`write_report_artifacts`](artifacts::write_report_artifacts)

pub mod adapters;
pub mod artifacts;
pub mod cancel;
pub mod corrector;
pub mod error;
pub mod ports;
pub mod settings;

pub use cancel::CancelFlag;
pub use corrector::BulkAttributeCorrector;
pub use error::{ItemError, SweepError};
pub use ports::CatalogPorts;
pub use settings::RunSettings;

// Re-export spec validation so embedders don't need bulkedit-domain directly.
pub use bulkedit_domain::{SpecError, validate_specs};
