use chrono::{DateTime, Utc};

use crate::{FileBundle, MessageId, MessageStatus, ProgressInfo, Role, ThinkingRegion};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session_id: Option<String>,
    pub base_artifact_id: Option<String>,
    pub messages: Vec<MessageView>,
    pub progress: Option<ProgressInfo>,
    pub streaming: bool,
    pub loading: bool,
    /// Latest emitted bundle, whether or not the preview shows it yet.
    pub bundle: FileBundle,
    /// Bundle currently committed to the preview surface.
    pub preview: Option<FileBundle>,
    pub sandbox_ready: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub body: String,
    pub thinking: Option<ThinkingRegion>,
    pub status: Option<MessageStatus>,
    pub timestamp: DateTime<Utc>,
}
