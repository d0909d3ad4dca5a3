//! Edit records and their total-order key.

use crate::SubjectType;
use serde::{Deserialize, Serialize};

/// A structured fact derived from one classified line: who edited what,
/// where, when, and whether the edit created or destroyed the subject.
///
/// Ordering and equality are defined over the key
/// `(timestamp_ms, is_creation, x, y, z)` only. Timestamps carry
/// whole-second precision (the source patterns never supply millis), so two
/// genuinely distinct edits can share a key; the edit log deliberately
/// collapses them to one record. At an equal timestamp a destruction sorts
/// before a creation. Actor and subject are payload, not part of the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRecord {
    /// Milliseconds since the Unix epoch, truncated to whole seconds.
    pub timestamp_ms: i64,
    /// Who performed the edit.
    pub actor: String,
    /// True for a creation, false for a destruction.
    pub is_creation: bool,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// What was created or destroyed.
    pub subject: SubjectType,
}

impl EditRecord {
    fn key(&self) -> (i64, bool, i32, i32, i32) {
        (self.timestamp_ms, self.is_creation, self.x, self.y, self.z)
    }

    /// Whether this record sits at the given coordinates.
    pub fn at(&self, x: i32, y: i32, z: i32) -> bool {
        self.x == x && self.y == y && self.z == z
    }
}

impl PartialEq for EditRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EditRecord {}

impl Ord for EditRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for EditRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
