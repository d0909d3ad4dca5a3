//! Declarative per-category extraction rules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What an edit-category line means for the edit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// The line reports something being created.
    Creation,
    /// The line reports something being destroyed.
    Destruction,
    /// The line only updates the last-known context; no record is appended.
    ContextOnly,
}

/// Reference to a capture group of the category's full pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupRef {
    Index(usize),
    Name(String),
}

/// The typed field a capture converts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Actor,
    X,
    Y,
    Z,
    Subject,
    Timestamp,
}

/// One (group, field) binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldBinding {
    pub group: GroupRef,
    pub field: FieldKind,
}

impl FieldBinding {
    pub fn named(group: impl Into<String>, field: FieldKind) -> Self {
        Self {
            group: GroupRef::Name(group.into()),
            field,
        }
    }

    pub fn indexed(group: usize, field: FieldKind) -> Self {
        Self {
            group: GroupRef::Index(group),
            field,
        }
    }
}

/// The extraction rule for one category id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub category_id: String,
    pub kind: EditKind,
    #[serde(default)]
    pub fields: Vec<FieldBinding>,
}

/// Rules indexed by category id.
#[derive(Debug, Default)]
pub struct ExtractionRules {
    by_category: HashMap<String, ExtractionRule>,
}

impl ExtractionRules {
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        let by_category = rules
            .into_iter()
            .map(|r| (r.category_id.clone(), r))
            .collect();
        Self { by_category }
    }

    pub fn get(&self, category_id: &str) -> Option<&ExtractionRule> {
        self.by_category.get(category_id)
    }

    /// Ids of the categories these rules cover.
    pub fn category_ids(&self) -> impl Iterator<Item = &str> {
        self.by_category.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_category.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }
}
