//! File loaders for the category table, subject registry and exclusion set.
//!
//! The core consumes the category table as an immutable ordered sequence
//! and does not care about the storage format; these loaders are the
//! bundled collaborators for the formats the binary ships with (YAML for
//! categories and subjects, JSON for the excluded-tag set).

use crate::{Result, subjects::StaticRegistry};
use chatsift_types::Category;
use crate::extract::ExtractionRule;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// On-disk category file: the ordered table plus the extraction rules for
/// the categories that feed structured extraction.
#[derive(Debug, Deserialize)]
pub struct CategoryFile {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub rules: Vec<ExtractionRule>,
}

/// Load a category file (YAML). Order in the file is priority order.
pub fn load_category_file(path: &Path) -> Result<CategoryFile> {
    let content = std::fs::read_to_string(path)?;
    let file: CategoryFile = serde_yaml::from_str(&content)?;
    debug!(
        target: "chatsift::classify",
        path = %path.display(),
        categories = file.categories.len(),
        rules = file.rules.len(),
        "loaded category file"
    );
    Ok(file)
}

/// Load the subject registry from a YAML `name: id` map.
pub fn load_subjects(path: &Path) -> Result<StaticRegistry> {
    let content = std::fs::read_to_string(path)?;
    let entries: std::collections::HashMap<String, i32> = serde_yaml::from_str(&content)?;
    Ok(StaticRegistry::new(entries))
}

/// Load the persisted excluded-tag set (JSON array). A missing file is an
/// empty set, not an error.
pub fn load_excluded_tags(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let content = std::fs::read_to_string(path)?;
    let tags: HashSet<String> = serde_json::from_str(&content)?;
    Ok(tags)
}

/// Persist the excluded-tag set as a sorted JSON array.
pub fn save_excluded_tags(path: &Path, tags: &HashSet<String>) -> Result<()> {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let content = serde_json::to_string_pretty(&sorted)?;
    std::fs::write(path, content)?;
    Ok(())
}
