//! Per-session ordered, deduplicating edit logs.

use chatsift_types::{EditRecord, SessionKey};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// An ordered collection of edit records with set semantics.
///
/// Records sort by `(timestamp, is_creation, x, y, z)`, per
/// [`EditRecord`]'s `Ord` impl. Two records with an identical key collapse
/// to one; with whole-second timestamps this can swallow a rare true
/// duplicate, a deliberate trade for simple comparison-based ordering.
#[derive(Debug, Default)]
pub struct EditLog {
    records: BTreeSet<EditRecord>,
}

impl EditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, preserving total order. Returns false when a record
    /// with the same key was already present (the earlier record wins).
    pub fn add(&mut self, record: EditRecord) -> bool {
        let inserted = self.records.insert(record);
        if !inserted {
            trace!(target: "chatsift::editlog", "duplicate key collapsed");
        }
        inserted
    }

    /// Linear scan oldest-to-newest for the first record at the given
    /// coordinates, optionally restricted to one actor. O(n), acceptable
    /// because n is bounded by realistic query result sizes.
    pub fn find_first(&self, x: i32, y: i32, z: i32, actor: Option<&str>) -> Option<&EditRecord> {
        self.records
            .iter()
            .find(|r| r.at(x, y, z) && actor.is_none_or(|a| r.actor == a))
    }

    /// Records in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &EditRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// All edit logs, keyed by session. A log is created lazily on first access
/// and lives for the rest of the process; logs for different sessions are
/// fully independent.
#[derive(Debug, Default)]
pub struct EditLogs {
    logs: HashMap<SessionKey, EditLog>,
}

impl EditLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// The log for a session, created on first access.
    pub fn log_mut(&mut self, key: &SessionKey) -> &mut EditLog {
        if !self.logs.contains_key(key) {
            debug!(target: "chatsift::editlog", session = %key, "creating edit log");
        }
        self.logs.entry(key.clone()).or_default()
    }

    /// The log for a session, if one has been created.
    pub fn log(&self, key: &SessionKey) -> Option<&EditLog> {
        self.logs.get(key)
    }

    /// Number of sessions with a log.
    pub fn session_count(&self) -> usize {
        self.logs.len()
    }
}
