use chrono::{DateTime, Utc};

use crate::bundle::FileBundle;
use crate::transcript::Role;

/// The conversation a chat turn belongs to and the artifact it builds on.
///
/// Passed explicitly into every request; there is no process-wide copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    pub session_id: Option<String>,
    pub base_artifact_id: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: Option<String>, base_artifact_id: Option<String>) -> Self {
        Self {
            session_id,
            base_artifact_id,
        }
    }

    /// Adopt a session id announced by the backend. Returns `true` on change.
    pub fn adopt_session(&mut self, session_id: &str) -> bool {
        if self.session_id.as_deref() == Some(session_id) {
            return false;
        }
        self.session_id = Some(session_id.to_string());
        true
    }

    /// Adopt a completed artifact as the new base. `None` keeps the current base.
    pub fn adopt_artifact(&mut self, artifact_id: Option<&str>) -> bool {
        match artifact_id {
            Some(id) if self.base_artifact_id.as_deref() != Some(id) => {
                self.base_artifact_id = Some(id.to_string());
                true
            }
            _ => false,
        }
    }

    /// Switch to another session; the base artifact belongs to the old one.
    pub fn switch_to(&mut self, session_id: &str) -> bool {
        if self.session_id.as_deref() == Some(session_id) {
            return false;
        }
        self.session_id = Some(session_id.to_string());
        self.base_artifact_id = None;
        true
    }
}

/// One message of a fetched session transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A fully resolved artifact: id plus every file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSnapshot {
    pub artifact_id: String,
    pub files: FileBundle,
}

/// A fetched session with its most recent artifact, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub messages: Vec<HistoryEntry>,
    pub artifact: Option<ArtifactSnapshot>,
}
