//! Error types for chatsift.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiftError {
    #[error("pattern for category '{id}' failed to compile: {source}")]
    PatternCompile {
        id: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("extraction failed for category '{category}': {reason}")]
    Extraction { category: String, reason: String },

    #[error("unknown category id: {0}")]
    UnknownCategory(String),

    #[error("ingestion channel closed")]
    ChannelClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SiftError {
    /// Shorthand for extraction failures.
    pub fn extraction(category: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            category: category.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for chatsift operations.
pub type Result<T> = std::result::Result<T, SiftError>;
