use bulkedit_types::ids::TermId;
use std::collections::{BTreeMap, BTreeSet};

/// Result of correcting a product's term assignment for one taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSetChange {
    pub before: Vec<TermId>,
    pub after: Vec<TermId>,
    pub removed_old: bool,
    pub added_new: bool,
    /// The stored assignment listed some term more than once.
    pub collapsed_duplicates: bool,
}

impl TermSetChange {
    /// True when the stored assignment is already correct and needs no write.
    pub fn is_noop(&self) -> bool {
        self.before == self.after && !self.collapsed_duplicates
    }
}

/// Swap `old` for `new` in a term assignment.
///
/// `old` is removed only if assigned; `new` is always present afterwards. Both sides are
/// returned sorted and unique, so a second call with the output is a no-op. A stored
/// assignment with duplicate ids is never a no-op: writing `after` collapses them.
pub fn correct_term_set(current: &[TermId], old: TermId, new: TermId) -> TermSetChange {
    let before: BTreeSet<TermId> = current.iter().copied().collect();

    let mut after = before.clone();
    let removed_old = old != new && after.remove(&old);
    let added_new = after.insert(new);
    let collapsed_duplicates = before.len() != current.len();

    TermSetChange {
        before: before.into_iter().collect(),
        after: after.into_iter().collect(),
        removed_old,
        added_new,
        collapsed_duplicates,
    }
}

/// Replace the value stored under `key` when it equals `old` exactly.
///
/// Returns `None` when the map should be left untouched.
pub fn correct_variation_attributes(
    attributes: &BTreeMap<String, String>,
    key: &str,
    old: &str,
    new: &str,
) -> Option<BTreeMap<String, String>> {
    match attributes.get(key) {
        Some(current) if current == old && old != new => {
            let mut updated = attributes.clone();
            updated.insert(key.to_string(), new.to_string());
            Some(updated)
        }
        _ => None,
    }
}
