use crate::bundle::FileBundle;
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartStream(ChatRequest),
    FetchSession { session_id: String },
    FetchArtifact { artifact_id: String },
    /// Present this bundle on the preview surface.
    ShowPreview(FileBundle),
    /// Session or base artifact changed; persist it for the next run.
    SessionContextChanged(SessionContext),
}

/// One outbound chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub content: String,
    pub session_id: Option<String>,
    pub base_artifact_id: Option<String>,
    pub dataset_id: Option<String>,
}
