//! Session identity for edit-log partitioning.

use serde::{Deserialize, Serialize};

/// Identifies one independent edit log: the server the session is connected
/// to plus the dimension the edits belong to. Local single-player sessions
/// use an empty server identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Server identity, empty for local-only sessions.
    pub server: String,
    /// Dimension id within the server's world.
    pub dimension: i32,
}

impl SessionKey {
    pub fn new(server: impl Into<String>, dimension: i32) -> Self {
        Self {
            server: server.into(),
            dimension,
        }
    }

    /// Key for a local (serverless) session.
    pub fn local(dimension: i32) -> Self {
        Self::new("", dimension)
    }

    /// Whether this key describes a local session.
    pub fn is_local(&self) -> bool {
        self.server.is_empty()
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_local() {
            write!(f, "local/dim{}", self.dimension)
        } else {
            write!(f, "{}/dim{}", self.server, self.dimension)
        }
    }
}
