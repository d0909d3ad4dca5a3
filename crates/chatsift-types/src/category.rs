//! Category descriptors for the ordered pattern table.

use serde::{Deserialize, Serialize};

/// One entry of the category table.
///
/// Categories are evaluated in the order the table supplies them; the first
/// matching entry wins. Entries are immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (e.g. "lb.coord.created").
    pub id: String,
    /// Routing label; several categories may share a tag.
    pub tag: String,
    /// Pattern that a leading fragment of a split line matches. Only
    /// consulted when `extensible` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_pattern: Option<String>,
    /// Pattern the complete line must match in full.
    pub full_pattern: String,
    /// Whether matched lines may arrive split across deliveries and need
    /// reassembly before `full_pattern` can match.
    #[serde(default)]
    pub extensible: bool,
}

impl Category {
    /// Create a non-extensible category.
    pub fn new(id: impl Into<String>, tag: impl Into<String>, full_pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            initial_pattern: None,
            full_pattern: full_pattern.into(),
            extensible: false,
        }
    }

    /// Create an extensible category with an initial (fragment) pattern.
    pub fn extensible(
        id: impl Into<String>,
        tag: impl Into<String>,
        initial_pattern: impl Into<String>,
        full_pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            initial_pattern: Some(initial_pattern.into()),
            full_pattern: full_pattern.into(),
            extensible: true,
        }
    }
}
