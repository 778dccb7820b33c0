use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub type StreamId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// One complete line of a chat stream, in arrival order.
    StreamLine { stream_id: StreamId, line: String },
    StreamFinished {
        stream_id: StreamId,
        summary: StreamSummary,
    },
    StreamFailed {
        stream_id: StreamId,
        error: StreamError,
    },
    /// `Ok(None)` means the backend does not know the session.
    SessionResolved {
        session_id: String,
        result: Result<Option<ResolvedSession>, ApiError>,
    },
    ArtifactResolved {
        artifact_id: String,
        result: Result<ResolvedArtifact, ApiError>,
    },
}

/// One outbound chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatTurn {
    pub content: String,
    pub session_id: Option<String>,
    pub base_artifact_id: Option<String>,
    pub dataset_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    pub lines: usize,
    pub bytes: u64,
    pub saw_sentinel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    pub kind: FailureKind,
    pub message: String,
}

impl StreamError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {status}")]
    Http { status: u16 },
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Session as returned by `GET /api/chat/sessions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionRecord {
    #[serde(default, deserialize_with = "optional_identifier")]
    pub id: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
    #[serde(default)]
    pub latest_artifact: Option<ArtifactRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageRecord {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactRecord {
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    #[serde(default)]
    pub files: Option<ArtifactFiles>,
}

/// Artifact files, either keyed by path or as a list of entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArtifactFiles {
    Map(BTreeMap<String, String>),
    List(Vec<FileRecord>),
}

impl ArtifactFiles {
    pub fn into_map(self) -> BTreeMap<String, String> {
        match self {
            ArtifactFiles::Map(files) => files,
            ArtifactFiles::List(files) => files
                .into_iter()
                .map(|file| (file.path, file.code))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileRecord {
    pub path: String,
    #[serde(alias = "content")]
    pub code: String,
}

/// A session with its most recent artifact fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub session_id: String,
    pub messages: Vec<MessageRecord>,
    pub artifact: Option<ResolvedArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub id: String,
    pub files: BTreeMap<String, String>,
}

fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn optional_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(id) => Ok(Some(id)),
        Value::Number(id) => Ok(Some(id.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
