use studio_logging::{studio_info, studio_warn};

use crate::{ApiError, ArtifactRecord, ResolvedArtifact, ResolvedSession, SessionRecord};

#[async_trait::async_trait]
pub trait BackendApi: Send + Sync {
    /// `Ok(None)` when the backend answers 404.
    async fn fetch_session(&self, session_id: &str) -> Result<Option<SessionRecord>, ApiError>;

    async fn fetch_artifact(&self, artifact_id: &str) -> Result<ArtifactRecord, ApiError>;
}

/// Fetch a session and resolve the files of its most recent artifact.
///
/// Inline files are used as-is; otherwise the artifact is fetched by id. A
/// failed artifact fetch is logged and leaves the artifact unresolved.
pub async fn resolve_session(
    api: &dyn BackendApi,
    session_id: &str,
) -> Result<Option<ResolvedSession>, ApiError> {
    let Some(record) = api.fetch_session(session_id).await? else {
        studio_info!("Session {} not found; starting with empty history", session_id);
        return Ok(None);
    };

    let SessionRecord {
        id,
        messages,
        artifacts,
        latest_artifact,
    } = record;
    let artifact = match latest_artifact.or_else(|| artifacts.into_iter().last()) {
        Some(artifact) => resolve_artifact_files(api, artifact).await,
        None => None,
    };

    Ok(Some(ResolvedSession {
        session_id: id.unwrap_or_else(|| session_id.to_string()),
        messages,
        artifact,
    }))
}

/// Fetch one artifact by id with all of its files.
pub(crate) async fn resolve_artifact(
    api: &dyn BackendApi,
    artifact_id: &str,
) -> Result<ResolvedArtifact, ApiError> {
    let record = api.fetch_artifact(artifact_id).await?;
    Ok(ResolvedArtifact {
        id: record.id,
        files: record.files.map(|files| files.into_map()).unwrap_or_default(),
    })
}

async fn resolve_artifact_files(
    api: &dyn BackendApi,
    artifact: ArtifactRecord,
) -> Option<ResolvedArtifact> {
    let inline = artifact
        .files
        .map(|files| files.into_map())
        .filter(|files| !files.is_empty());
    if let Some(files) = inline {
        return Some(ResolvedArtifact {
            id: artifact.id,
            files,
        });
    }

    match resolve_artifact(api, &artifact.id).await {
        Ok(resolved) => Some(resolved),
        Err(err) => {
            studio_warn!("Failed to fetch artifact {}: {}", artifact.id, err);
            None
        }
    }
}
