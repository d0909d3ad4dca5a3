//! Subject-type registry.

use chatsift_types::SubjectType;
use std::collections::HashMap;

/// Resolves subject names to types. A miss resolves to the unknown sentinel
/// rather than an error, so extraction always completes.
pub trait SubjectRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> SubjectType;
}

/// Registry backed by a fixed name-to-id map. Lookups are
/// case-insensitive and tolerate surrounding whitespace.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    by_name: HashMap<String, SubjectType>,
}

impl StaticRegistry {
    pub fn new(entries: impl IntoIterator<Item = (String, i32)>) -> Self {
        let by_name = entries
            .into_iter()
            .map(|(name, id)| {
                let key = normalize(&name);
                (key, SubjectType::new(id, name))
            })
            .collect();
        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl SubjectRegistry for StaticRegistry {
    fn lookup(&self, name: &str) -> SubjectType {
        self.by_name
            .get(&normalize(name))
            .cloned()
            .unwrap_or_else(SubjectType::unknown)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
