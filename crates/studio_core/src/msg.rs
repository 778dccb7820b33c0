use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::session::{ArtifactSnapshot, SessionSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User sent a prompt.
    PromptSubmitted { content: String, at: DateTime<Utc> },
    /// One decoded line of the active chat stream.
    StreamLine { line: String, now: Instant },
    /// Transport reached the end of the stream.
    StreamClosed { now: Instant },
    /// Transport failed (non-2xx status, network error).
    StreamFailed {
        error: String,
        at: DateTime<Utc>,
        now: Instant,
    },
    /// Timer tick used to release throttled bundle updates.
    Tick { now: Instant },
    /// User opened a session by id, e.g. from a deep link.
    OpenSession { session_id: String },
    /// Session fetch finished. `None` means the backend has no such session.
    SessionLoaded {
        session_id: String,
        snapshot: Option<SessionSnapshot>,
    },
    SessionLoadFailed { session_id: String, error: String },
    /// User opened a single artifact by id.
    OpenArtifact { artifact_id: String },
    ArtifactLoaded { artifact: ArtifactSnapshot },
    ArtifactLoadFailed { artifact_id: String, error: String },
    /// Preview sandbox finished bootstrapping.
    SandboxReady,
    /// Dataset to attach to new conversations.
    DatasetSelected { dataset_id: Option<String> },
    NoOp,
}
