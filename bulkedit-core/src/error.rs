//! Error types for the sweep.
//!
//! This module distinguishes between:
//! - Sweep errors: the run could not start at all (non-zero exit)
//! - Item errors: one product, variation or spec failed; recorded in the report, never fatal

use bulkedit_domain::SpecError;
use bulkedit_types::ids::ProductId;
use bulkedit_types::query::FilterError;
use bulkedit_types::report::FailureStage;
use thiserror::Error;

/// The run could not start.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid correction specs: {0}")]
    InvalidSpecs(#[from] SpecError),

    #[error("invalid query filters: {0}")]
    InvalidFilters(#[from] FilterError),

    #[error("sweep could not start: {0:#}")]
    Start(anyhow::Error),
}

impl SweepError {
    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// A per-item failure caught at the product boundary.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("product {id} not found")]
    ProductNotFound { id: ProductId },

    #[error("variation {id} not found")]
    VariationNotFound { id: ProductId },

    #[error("load {id}: {source:#}")]
    Load {
        id: ProductId,
        #[source]
        source: anyhow::Error,
    },

    #[error("term '{slug}' not found in {taxonomy}")]
    TermNotFound { taxonomy: String, slug: String },

    #[error("resolve term '{slug}' in {taxonomy}: {source:#}")]
    TermLookup {
        taxonomy: String,
        slug: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("read {taxonomy} terms of {id}: {source:#}")]
    AssignedTerms {
        id: ProductId,
        taxonomy: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("write {what} for {id}: {source:#}")]
    Write {
        id: ProductId,
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ItemError {
    pub fn stage(&self) -> FailureStage {
        match self {
            ItemError::ProductNotFound { .. }
            | ItemError::VariationNotFound { .. }
            | ItemError::Load { .. }
            | ItemError::AssignedTerms { .. } => FailureStage::Load,
            ItemError::TermNotFound { .. } | ItemError::TermLookup { .. } => {
                FailureStage::TermResolution
            }
            ItemError::Write { .. } => FailureStage::Persistence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_errors_map_to_stages() {
        let not_found = ItemError::ProductNotFound { id: ProductId(1) };
        assert_eq!(not_found.stage(), FailureStage::Load);
        assert_eq!(not_found.to_string(), "product 1 not found");

        let term = ItemError::TermNotFound {
            taxonomy: "pa_color".into(),
            slug: "red".into(),
        };
        assert_eq!(term.stage(), FailureStage::TermResolution);
        assert_eq!(term.to_string(), "term 'red' not found in pa_color");

        let write = ItemError::Write {
            id: ProductId(2),
            what: "variation attributes",
            source: anyhow::anyhow!("rejected"),
        };
        assert_eq!(write.stage(), FailureStage::Persistence);
        assert!(write.to_string().contains("rejected"));
    }

    #[test]
    fn sweep_errors_exit_non_zero() {
        let err = SweepError::Start(anyhow::anyhow!("catalog unreachable"));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("catalog unreachable"));

        let err = SweepError::from(SpecError::EmptyAttributeKey { index: 0 });
        assert!(err.to_string().starts_with("invalid correction specs"));

        let err = SweepError::from(FilterError::ZeroPageSize);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "invalid query filters: page_size must be greater than zero"
        );
    }
}
