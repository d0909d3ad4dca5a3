//! Classified line and pipeline event types.

use serde::{Deserialize, Serialize};

/// A line after classification against the category table.
///
/// `raw` keeps the text exactly as delivered (formatting markers intact) for
/// the display path; `canonical` is the marker-stripped text used for pattern
/// matching and capture extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedLine {
    /// Text as delivered, formatting markers preserved.
    pub raw: String,
    /// Marker-stripped text used for matching.
    pub canonical: String,
    /// Id of the winning category, or `None` for unmatched lines.
    pub category_id: Option<String>,
    /// Tag of the winning category, or `None` for unmatched lines.
    pub tag: Option<String>,
    /// Arrival sequence number; preserved across reassembly (a reassembled
    /// line keeps the sequence of its first fragment).
    pub seq: u64,
}

impl ClassifiedLine {
    /// Create an unmatched line.
    pub fn unmatched(raw: impl Into<String>, canonical: impl Into<String>, seq: u64) -> Self {
        Self {
            raw: raw.into(),
            canonical: canonical.into(),
            category_id: None,
            tag: None,
            seq,
        }
    }

    /// Whether a category matched this line.
    pub fn is_classified(&self) -> bool {
        self.category_id.is_some()
    }
}

/// Event emitted by the classifier and routed through the dispatch table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineEvent {
    /// A line was classified (possibly as unmatched).
    Classified(ClassifiedLine),
    /// A previously buffered fragment was superseded by a reassembled,
    /// fully-matched line. Handlers receive both so they can retract any
    /// state derived from the old version.
    Revised {
        old: ClassifiedLine,
        new: ClassifiedLine,
    },
}

impl LineEvent {
    /// The current (newest) line carried by this event.
    pub fn line(&self) -> &ClassifiedLine {
        match self {
            LineEvent::Classified(line) => line,
            LineEvent::Revised { new, .. } => new,
        }
    }
}
