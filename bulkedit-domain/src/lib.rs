//! Domain logic: compute the corrected state of a product or variation.
//!
//! This crate owns *what* a correction changes. It does not own *how* the new state is read
//! or written; that's the `bulkedit-core` crate and its ports.

mod correction;
mod validate;

pub use correction::{TermSetChange, correct_term_set, correct_variation_attributes};
pub use validate::{SpecError, validate_spec, validate_specs};
