use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use studio_core::{
    ArtifactSnapshot, ChatRequest, Effect, FileBundle, HistoryEntry, Msg, Role, SessionSnapshot,
};
use studio_engine::{
    ChatTurn, EngineEvent, EngineHandle, MessageRecord, ResolvedArtifact, ResolvedSession,
    StreamId,
};
use studio_logging::{studio_debug, studio_info, studio_warn};

use super::persistence;
use super::preview::DirectoryPreview;

/// Executes core effects against the engine and preview, and turns engine
/// events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    preview: DirectoryPreview,
    state_dir: PathBuf,
    active_stream: Option<StreamId>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, preview: DirectoryPreview, state_dir: PathBuf) -> Self {
        Self {
            engine,
            preview,
            state_dir,
            active_stream: None,
        }
    }

    pub fn preview(&self) -> &DirectoryPreview {
        &self.preview
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartStream(request) => {
                    studio_info!(
                        "StartStream session={:?} base_artifact={:?} content_len={}",
                        request.session_id,
                        request.base_artifact_id,
                        request.content.len()
                    );
                    let stream_id = self.engine.start_stream(to_turn(request));
                    self.active_stream = Some(stream_id);
                }
                Effect::FetchSession { session_id } => {
                    studio_info!("FetchSession session={}", session_id);
                    self.engine.load_session(session_id);
                }
                Effect::FetchArtifact { artifact_id } => {
                    studio_info!("FetchArtifact artifact={}", artifact_id);
                    self.engine.load_artifact(artifact_id);
                }
                Effect::ShowPreview(bundle) => self.preview.show(&bundle),
                Effect::SessionContextChanged(context) => {
                    persistence::save_session_context(&self.state_dir, &context);
                }
            }
        }
    }

    /// Collect every engine event that is already available.
    pub fn drain(&mut self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            inbox.extend(self.translate(event));
        }
        inbox
    }

    /// Wait up to `timeout` for the next engine event.
    pub fn wait(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        self.translate(event)
    }

    fn translate(&mut self, event: EngineEvent) -> Option<Msg> {
        match event {
            EngineEvent::StreamLine { stream_id, line } => {
                if !self.is_active(stream_id) {
                    return None;
                }
                Some(Msg::StreamLine {
                    line,
                    now: Instant::now(),
                })
            }
            EngineEvent::StreamFinished { stream_id, summary } => {
                if !self.is_active(stream_id) {
                    return None;
                }
                self.active_stream = None;
                studio_debug!(
                    "Stream {} finished: lines={} bytes={} sentinel={}",
                    stream_id,
                    summary.lines,
                    summary.bytes,
                    summary.saw_sentinel
                );
                Some(Msg::StreamClosed {
                    now: Instant::now(),
                })
            }
            EngineEvent::StreamFailed { stream_id, error } => {
                if !self.is_active(stream_id) {
                    return None;
                }
                self.active_stream = None;
                Some(Msg::StreamFailed {
                    error: error.to_string(),
                    at: Utc::now(),
                    now: Instant::now(),
                })
            }
            EngineEvent::SessionResolved { session_id, result } => Some(match result {
                Ok(resolved) => Msg::SessionLoaded {
                    session_id,
                    snapshot: resolved.map(session_snapshot),
                },
                Err(err) => {
                    studio_warn!("Session {} failed to load: {}", session_id, err);
                    Msg::SessionLoadFailed {
                        session_id,
                        error: err.to_string(),
                    }
                }
            }),
            EngineEvent::ArtifactResolved {
                artifact_id,
                result,
            } => Some(match result {
                Ok(resolved) => Msg::ArtifactLoaded {
                    artifact: artifact_snapshot(artifact_id, resolved),
                },
                Err(err) => {
                    studio_warn!("Artifact {} failed to load: {}", artifact_id, err);
                    Msg::ArtifactLoadFailed {
                        artifact_id,
                        error: err.to_string(),
                    }
                }
            }),
        }
    }

    fn is_active(&self, stream_id: StreamId) -> bool {
        self.active_stream == Some(stream_id)
    }
}

fn to_turn(request: ChatRequest) -> ChatTurn {
    ChatTurn {
        content: request.content,
        session_id: request.session_id,
        base_artifact_id: request.base_artifact_id,
        dataset_id: request.dataset_id,
    }
}

fn session_snapshot(resolved: ResolvedSession) -> SessionSnapshot {
    SessionSnapshot {
        messages: resolved.messages.into_iter().map(history_entry).collect(),
        artifact: resolved
            .artifact
            .map(|artifact| artifact_snapshot(artifact.id.clone(), artifact)),
    }
}

/// The requested id is kept so the core can match the reply to its request.
fn artifact_snapshot(artifact_id: String, resolved: ResolvedArtifact) -> ArtifactSnapshot {
    ArtifactSnapshot {
        artifact_id,
        files: resolved.files.into_iter().collect::<FileBundle>(),
    }
}

fn history_entry(record: MessageRecord) -> HistoryEntry {
    let role = if record.role.eq_ignore_ascii_case("user") {
        Role::User
    } else {
        Role::Assistant
    };
    let timestamp = record
        .created_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    HistoryEntry {
        role,
        content: record.content,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn history_roles_and_timestamps_map() {
        let user = history_entry(MessageRecord {
            role: "user".into(),
            content: "hi".into(),
            created_at: Some("2024-05-01T10:00:00Z".into()),
        });
        assert_eq!(user.role, Role::User);
        assert_eq!(user.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");

        let other = history_entry(MessageRecord {
            role: "assistant".into(),
            content: "ok".into(),
            created_at: Some("yesterday".into()),
        });
        assert_eq!(other.role, Role::Assistant);
    }

    #[test]
    fn resolved_session_becomes_snapshot() {
        let mut files = BTreeMap::new();
        files.insert("App.tsx".to_string(), "x".to_string());
        files.insert("/styles.css".to_string(), String::new());
        let snapshot = session_snapshot(ResolvedSession {
            session_id: "s1".into(),
            messages: Vec::new(),
            artifact: Some(ResolvedArtifact {
                id: "a1".into(),
                files,
            }),
        });

        let artifact = snapshot.artifact.unwrap();
        assert_eq!(artifact.artifact_id, "a1");
        assert_eq!(artifact.files.get("/App.tsx"), Some("x"));
        assert_eq!(artifact.files.get("/styles.css"), Some(""));
        assert_eq!(artifact.files.len(), 2);
    }
}
