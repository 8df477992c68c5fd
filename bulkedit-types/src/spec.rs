use serde::{Deserialize, Serialize};

/// Prefix shared by attribute taxonomies.
pub const TAXONOMY_PREFIX: &str = "pa_";

/// One desired rename of an attribute value.
///
/// Specs are applied independently and in order. The parent product is
/// corrected through taxonomy terms, variations through their literal
/// attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrectionSpec {
    pub attribute_key: String,
    pub old_value: String,
    pub new_value: String,
}

impl CorrectionSpec {
    pub fn new(
        attribute_key: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            attribute_key: attribute_key.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    /// Taxonomy the attribute lives in, e.g. `color` -> `pa_color`.
    ///
    /// Variations store their literal value under this same key.
    pub fn taxonomy(&self) -> String {
        if self.attribute_key.starts_with(TAXONOMY_PREFIX) {
            self.attribute_key.clone()
        } else {
            format!("{}{}", TAXONOMY_PREFIX, self.attribute_key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_adds_prefix_once() {
        assert_eq!(CorrectionSpec::new("color", "a", "b").taxonomy(), "pa_color");
        assert_eq!(
            CorrectionSpec::new("pa_color", "a", "b").taxonomy(),
            "pa_color"
        );
    }
}
