//! Compiled category table.
//!
//! The table compiles the externally supplied, ordered category list once at
//! load time. A pattern that fails to compile is reported and its category
//! skipped for the session; it is never fatal.

use crate::{Result, SiftError};
use chatsift_types::Category;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

/// A category with its patterns compiled.
#[derive(Debug)]
pub struct CompiledCategory {
    category: Category,
    full: Regex,
    initial: Option<Regex>,
}

impl CompiledCategory {
    pub fn id(&self) -> &str {
        &self.category.id
    }

    pub fn tag(&self) -> &str {
        &self.category.tag
    }

    pub fn extensible(&self) -> bool {
        self.category.extensible
    }

    /// Whether the full pattern matches the entire text.
    pub fn full_match(&self, text: &str) -> bool {
        self.full.is_match(text)
    }

    /// Capture groups of the full pattern against the entire text.
    pub fn full_captures<'t>(&self, text: &'t str) -> Option<regex::Captures<'t>> {
        self.full.captures(text)
    }

    /// Whether the initial pattern matches a leading portion of the text.
    /// Always false for categories without an initial pattern.
    pub fn initial_match(&self, text: &str) -> bool {
        self.initial.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// The ordered, compiled category table. Evaluation order is the order the
/// categories were supplied in; changing it changes classification outcomes
/// deterministically.
#[derive(Debug, Default)]
pub struct CategoryTable {
    entries: Vec<CompiledCategory>,
    by_id: HashMap<String, usize>,
}

impl CategoryTable {
    /// Compile a category list in order.
    ///
    /// Returns the table plus one error per skipped (non-compiling)
    /// category; the table always classifies with whatever compiled.
    pub fn compile(categories: Vec<Category>) -> (Self, Vec<SiftError>) {
        let mut table = Self::default();
        let mut errors = Vec::new();

        for category in categories {
            match compile_entry(category) {
                Ok(entry) => {
                    if table.by_id.contains_key(entry.id()) {
                        warn!(
                            target: "chatsift::classify",
                            id = entry.id(),
                            "duplicate category id, keeping the earlier entry"
                        );
                        continue;
                    }
                    table.by_id.insert(entry.id().to_string(), table.entries.len());
                    table.entries.push(entry);
                }
                Err(e) => {
                    warn!(target: "chatsift::classify", error = %e, "skipping category");
                    errors.push(e);
                }
            }
        }

        (table, errors)
    }

    /// Entries in priority order.
    pub fn entries(&self) -> impl Iterator<Item = &CompiledCategory> {
        self.entries.iter()
    }

    /// Look up a compiled category by id.
    pub fn get(&self, id: &str) -> Option<&CompiledCategory> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compile_entry(category: Category) -> Result<CompiledCategory> {
    // Full patterns must cover the whole line; initial patterns anchor only
    // at the start, so a fragment may match a leading portion.
    let full = anchor_compile(&category.id, &category.full_pattern, true)?;
    let initial = match (&category.initial_pattern, category.extensible) {
        (Some(pattern), true) => Some(anchor_compile(&category.id, pattern, false)?),
        (Some(_), false) => {
            warn!(
                target: "chatsift::classify",
                id = %category.id,
                "initial_pattern on a non-extensible category is ignored"
            );
            None
        }
        (None, _) => None,
    };

    Ok(CompiledCategory {
        category,
        full,
        initial,
    })
}

fn anchor_compile(id: &str, pattern: &str, full: bool) -> Result<Regex> {
    let anchored = if full {
        format!("^(?:{pattern})$")
    } else {
        format!("^(?:{pattern})")
    };
    Regex::new(&anchored).map_err(|e| SiftError::PatternCompile {
        id: id.to_string(),
        source: Box::new(e),
    })
}
