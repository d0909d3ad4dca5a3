//! Line classification with split-line reassembly.
//!
//! The classifier walks the category table in priority order for each
//! incoming line. A line that only matches the initial pattern of an
//! extensible category is buffered as a pending continuation and withheld
//! from dispatch until the next line either completes it (emitting a revise
//! event) or proves it stands alone. Nothing partial is ever surfaced, so a
//! revise replaces handler-internal state only, never a displayed line.

use crate::{markup::strip_markup, table::{CategoryTable, CompiledCategory}};
use chatsift_types::{ClassifiedLine, LineEvent};
use tracing::{debug, trace};

/// Default bound on concatenation attempts for one pending continuation.
/// Prevents unbounded buffering against a peer that never completes a line.
pub const DEFAULT_MAX_CONTINUATION_ATTEMPTS: u32 = 3;

#[derive(Debug)]
enum ClassifierState {
    /// No continuation pending.
    Idle,
    /// A line matched only the initial pattern of an extensible category
    /// and is buffered awaiting its continuation.
    AwaitingContinuation {
        pending: ClassifiedLine,
        category_id: String,
        attempts: u32,
    },
}

/// Stateful classifier; at most one pending continuation is held at a time.
#[derive(Debug)]
pub struct LineClassifier {
    state: ClassifierState,
    next_seq: u64,
    max_attempts: u32,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier {
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_CONTINUATION_ATTEMPTS)
    }

    /// Create a classifier with a custom continuation-attempt bound.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            state: ClassifierState::Idle,
            next_seq: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Whether a pending continuation is currently buffered.
    pub fn has_pending(&self) -> bool {
        matches!(self.state, ClassifierState::AwaitingContinuation { .. })
    }

    /// Classify one incoming raw line.
    ///
    /// Returns zero events (line buffered as a pending continuation), one
    /// event (plain classification, or a revise for a completed
    /// continuation), or two (a flushed pending line followed by the new
    /// line's own classification).
    pub fn classify(&mut self, table: &CategoryTable, raw: &str) -> Vec<LineEvent> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let canonical = strip_markup(raw).into_owned();

        let mut events = Vec::new();

        match std::mem::replace(&mut self.state, ClassifierState::Idle) {
            ClassifierState::Idle => {}
            ClassifierState::AwaitingContinuation {
                pending,
                category_id,
                attempts,
            } => {
                let combined_raw = format!("{}{}", pending.raw, raw);
                let combined_canonical = format!("{}{}", pending.canonical, canonical);

                let entry = table.get(&category_id);
                if let Some(entry) = entry.filter(|e| e.full_match(&combined_canonical)) {
                    let new = ClassifiedLine {
                        raw: combined_raw,
                        canonical: combined_canonical,
                        category_id: Some(entry.id().to_string()),
                        tag: Some(entry.tag().to_string()),
                        seq: pending.seq,
                    };
                    debug!(
                        target: "chatsift::classify",
                        category = entry.id(),
                        seq = pending.seq,
                        "reassembled continuation, revising"
                    );
                    events.push(LineEvent::Revised { old: pending, new });
                    return events;
                }

                let rebuffer = attempts + 1 < self.max_attempts
                    && entry.is_some_and(|e| e.initial_match(&combined_canonical));
                if rebuffer {
                    trace!(
                        target: "chatsift::classify",
                        category = %category_id,
                        attempts = attempts + 1,
                        "continuation still partial, re-buffering"
                    );
                    self.state = ClassifierState::AwaitingContinuation {
                        pending: ClassifiedLine::unmatched(
                            combined_raw,
                            combined_canonical,
                            pending.seq,
                        ),
                        category_id,
                        attempts: attempts + 1,
                    };
                    return events;
                }

                // Reassembly failed: the buffered line degrades to its own
                // best full-pattern match (never silently dropped) and the
                // new line is classified from scratch below.
                debug!(
                    target: "chatsift::classify",
                    category = %category_id,
                    seq = pending.seq,
                    "continuation did not complete, flushing buffered line"
                );
                events.push(self.classify_alone(table, pending));
            }
        }

        match scan(table, &canonical) {
            Scan::Full(entry) => {
                events.push(LineEvent::Classified(ClassifiedLine {
                    raw: raw.to_string(),
                    canonical,
                    category_id: Some(entry.id().to_string()),
                    tag: Some(entry.tag().to_string()),
                    seq,
                }));
            }
            Scan::Initial(entry) => {
                trace!(
                    target: "chatsift::classify",
                    category = entry.id(),
                    seq,
                    "initial-only match, buffering as pending continuation"
                );
                self.state = ClassifierState::AwaitingContinuation {
                    pending: ClassifiedLine::unmatched(raw, canonical, seq),
                    category_id: entry.id().to_string(),
                    attempts: 0,
                };
            }
            Scan::None => {
                // Unmatched lines still flow to display.
                events.push(LineEvent::Classified(ClassifiedLine::unmatched(
                    raw, canonical, seq,
                )));
            }
        }

        events
    }

    /// Resolve a dangling pending continuation, if any, classifying the
    /// buffered line on its own.
    pub fn flush(&mut self, table: &CategoryTable) -> Option<LineEvent> {
        match std::mem::replace(&mut self.state, ClassifierState::Idle) {
            ClassifierState::Idle => None,
            ClassifierState::AwaitingContinuation { pending, .. } => {
                debug!(
                    target: "chatsift::classify",
                    seq = pending.seq,
                    "flushing pending continuation"
                );
                Some(self.classify_alone(table, pending))
            }
        }
    }

    /// Best-effort classification of a line by full pattern only; used when
    /// reassembly gives up on a buffered fragment.
    fn classify_alone(&self, table: &CategoryTable, mut line: ClassifiedLine) -> LineEvent {
        for entry in table.entries() {
            if entry.full_match(&line.canonical) {
                line.category_id = Some(entry.id().to_string());
                line.tag = Some(entry.tag().to_string());
                break;
            }
        }
        LineEvent::Classified(line)
    }
}

enum Scan<'a> {
    Full(&'a CompiledCategory),
    Initial(&'a CompiledCategory),
    None,
}

/// Walk the table in priority order: any full match beats any initial-only
/// match, and within each kind the earlier entry wins.
fn scan<'a>(table: &'a CategoryTable, canonical: &str) -> Scan<'a> {
    for entry in table.entries() {
        if entry.full_match(canonical) {
            return Scan::Full(entry);
        }
    }
    for entry in table.entries() {
        if entry.extensible() && entry.initial_match(canonical) {
            return Scan::Initial(entry);
        }
    }
    Scan::None
}
