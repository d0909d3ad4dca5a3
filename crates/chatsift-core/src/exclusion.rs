//! Tag exclusion for the display path.
//!
//! Exclusion governs user-visible echo only: a line whose tag is excluded
//! never reaches the display sink, but tag-bound extraction handlers still
//! receive it. The set is held in memory here; loading and saving are the
//! persistence collaborator's job (see `loader`).

use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ExclusionFilter {
    excluded: HashSet<String>,
}

impl ExclusionFilter {
    pub fn new(excluded: HashSet<String>) -> Self {
        Self { excluded }
    }

    /// Whether lines with this tag are suppressed from display.
    pub fn is_excluded(&self, tag: &str) -> bool {
        self.excluded.contains(tag)
    }

    /// Mark a tag excluded or included. Returns true if the set changed.
    pub fn set_excluded(&mut self, tag: &str, excluded: bool) -> bool {
        let changed = if excluded {
            self.excluded.insert(tag.to_string())
        } else {
            self.excluded.remove(tag)
        };
        if changed {
            debug!(target: "chatsift::dispatch", tag, excluded, "exclusion set updated");
        }
        changed
    }

    /// Current excluded-tag set, for persistence.
    pub fn tags(&self) -> &HashSet<String> {
        &self.excluded
    }
}
