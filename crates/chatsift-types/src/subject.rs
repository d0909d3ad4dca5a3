//! Subject types resolved through an external registry.

use serde::{Deserialize, Serialize};

/// Numeric id reserved for the unknown sentinel.
pub const UNKNOWN_SUBJECT_ID: i32 = -1;

/// The kind of thing an edit created or destroyed, resolved by name through
/// a registry. Unrecognized names resolve to the unknown sentinel instead of
/// failing, so extraction always completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectType {
    pub id: i32,
    pub name: String,
}

impl SubjectType {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The sentinel returned for names the registry does not know.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_SUBJECT_ID, "unknown")
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_SUBJECT_ID
    }
}
