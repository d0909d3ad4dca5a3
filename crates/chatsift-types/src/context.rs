//! The last-known-context record.

use crate::SubjectType;
use serde::Serialize;

/// The most recently learned spatial/temporal/actor facts, overwritten only
/// by successful extraction and consumed by later, unrelated commands as
/// "the last thing we learned". Fields a given extraction did not learn keep
/// their previous values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LastContext {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub z: Option<i32>,
    pub timestamp_ms: Option<i64>,
    pub actor: Option<String>,
    pub subject: Option<SubjectType>,
}

impl LastContext {
    /// The last coordinates, if all three are known.
    pub fn position(&self) -> Option<(i32, i32, i32)> {
        Some((self.x?, self.y?, self.z?))
    }
}
