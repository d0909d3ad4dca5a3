//! Extraction rules and modules.
//!
//! Field extraction is declarative: each category id carries a list of
//! (capture group, field) bindings plus an edit kind, shared by every
//! module, so a new category needs no new handler code unless its semantics
//! genuinely differ.

mod edit;
mod rules;

pub use edit::EditExtractor;
pub use rules::{EditKind, ExtractionRule, ExtractionRules, FieldBinding, FieldKind, GroupRef};
