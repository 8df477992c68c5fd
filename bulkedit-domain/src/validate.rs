use bulkedit_types::spec::CorrectionSpec;
use thiserror::Error;
use tracing::debug;

/// A correction spec that can never be applied meaningfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("spec #{index}: attribute key is empty")]
    EmptyAttributeKey { index: usize },

    #[error("spec #{index} ({attribute}): {field} value is empty")]
    EmptyValue {
        index: usize,
        attribute: String,
        field: &'static str,
    },

    #[error("spec #{index} ({attribute}): old and new value are both '{value}'")]
    SameValue {
        index: usize,
        attribute: String,
        value: String,
    },
}

pub fn validate_spec(index: usize, spec: &CorrectionSpec) -> Result<(), SpecError> {
    if spec.attribute_key.trim().is_empty() {
        return Err(SpecError::EmptyAttributeKey { index });
    }
    for (field, value) in [("old", &spec.old_value), ("new", &spec.new_value)] {
        if value.trim().is_empty() {
            return Err(SpecError::EmptyValue {
                index,
                attribute: spec.attribute_key.clone(),
                field,
            });
        }
    }
    if spec.old_value == spec.new_value {
        return Err(SpecError::SameValue {
            index,
            attribute: spec.attribute_key.clone(),
            value: spec.old_value.clone(),
        });
    }
    Ok(())
}

/// Validate every spec; an empty list is valid.
pub fn validate_specs(specs: &[CorrectionSpec]) -> Result<(), SpecError> {
    for (index, spec) in specs.iter().enumerate() {
        validate_spec(index, spec)?;
    }
    debug!(count = specs.len(), "correction specs validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_valid() {
        assert!(validate_specs(&[]).is_ok());
    }

    #[test]
    fn rejects_empty_key() {
        let err = validate_specs(&[CorrectionSpec::new(" ", "a", "b")]).unwrap_err();
        assert_eq!(err, SpecError::EmptyAttributeKey { index: 0 });
    }

    #[test]
    fn rejects_empty_values() {
        let err = validate_specs(&[
            CorrectionSpec::new("color", "red", "crimson"),
            CorrectionSpec::new("color", "red", ""),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("spec #1"));
        assert!(err.to_string().contains("new value is empty"));
    }

    #[test]
    fn rejects_identical_values() {
        let err = validate_specs(&[CorrectionSpec::new("color", "red", "red")]).unwrap_err();
        assert!(matches!(err, SpecError::SameValue { .. }));
    }
}
