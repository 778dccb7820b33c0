use std::time::Instant;

use studio_logging::{studio_debug, studio_info, studio_warn};

use crate::{interpret_line, AppState, Effect, Frame, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PromptSubmitted { content, at } => {
            let content = content.trim();
            if content.is_empty() {
                return (state, Vec::new());
            }
            if state.is_streaming() || state.is_loading() {
                studio_warn!("Rejected prompt: a submission is already in progress");
                return (state, Vec::new());
            }
            let request = state.start_turn(content.to_string(), at);
            vec![Effect::StartStream(request)]
        }
        Msg::StreamLine { line, now } => match interpret_line(&line) {
            Some(frame) => apply_frame(&mut state, frame, now),
            None => Vec::new(),
        },
        Msg::StreamClosed { now } => state.finish_stream(now),
        Msg::StreamFailed { error, at, now } => {
            studio_warn!("Chat stream failed: {}", error);
            state.fail_stream(&error, at, now)
        }
        Msg::Tick { now } => state.flush_throttled(now),
        Msg::OpenSession { session_id } => {
            let session_id = session_id.trim();
            if session_id.is_empty() || state.is_streaming() {
                return (state, Vec::new());
            }
            let (started, mut effects) = state.begin_session_load(session_id);
            if !started {
                return (state, Vec::new());
            }
            effects.push(Effect::FetchSession {
                session_id: session_id.to_string(),
            });
            effects
        }
        Msg::SessionLoaded {
            session_id,
            snapshot,
        } => {
            if !state.finish_session_load(&session_id) {
                return (state, Vec::new());
            }
            if snapshot.is_none() {
                studio_info!("Session {} has no history", session_id);
            }
            state.apply_session(snapshot)
        }
        Msg::SessionLoadFailed { session_id, error } => {
            studio_warn!("Failed to load session {}: {}", session_id, error);
            state.finish_session_load(&session_id);
            Vec::new()
        }
        Msg::OpenArtifact { artifact_id } => {
            let artifact_id = artifact_id.trim();
            if artifact_id.is_empty() || state.is_streaming() {
                return (state, Vec::new());
            }
            if !state.begin_artifact_load(artifact_id) {
                return (state, Vec::new());
            }
            vec![Effect::FetchArtifact {
                artifact_id: artifact_id.to_string(),
            }]
        }
        Msg::ArtifactLoaded { artifact } => {
            if !state.finish_artifact_load(&artifact.artifact_id) {
                return (state, Vec::new());
            }
            state.apply_artifact(artifact)
        }
        Msg::ArtifactLoadFailed { artifact_id, error } => {
            studio_warn!("Failed to load artifact {}: {}", artifact_id, error);
            state.finish_artifact_load(&artifact_id);
            Vec::new()
        }
        Msg::SandboxReady => state.sandbox_ready(),
        Msg::DatasetSelected { dataset_id } => {
            state.set_dataset(dataset_id);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_frame(state: &mut AppState, frame: Frame, now: Instant) -> Vec<Effect> {
    if !state.is_streaming() {
        studio_debug!("Ignoring frame outside of a stream: {:?}", frame);
        return Vec::new();
    }
    match frame {
        Frame::SessionId(session_id) => state.adopt_session(&session_id).into_iter().collect(),
        Frame::ArtifactStart { .. } => {
            state.begin_artifact();
            Vec::new()
        }
        Frame::FileDelta { path, code } => state.apply_file_delta(&path, &code, now),
        Frame::ArtifactEnd { artifact_id } => state.end_artifact(artifact_id.as_deref(), now),
        Frame::Progress(progress) => {
            state.set_progress(progress);
            Vec::new()
        }
        Frame::Thinking(delta) => {
            state.append_thinking(&delta);
            Vec::new()
        }
        Frame::Message(delta) => {
            state.append_message(&delta);
            Vec::new()
        }
        Frame::Error(error) => {
            studio_warn!("Chat stream reported an error: {}", error);
            state.record_stream_error(&error);
            Vec::new()
        }
        Frame::StreamEnd => state.finish_stream(now),
        Frame::Unknown(kind) => {
            studio_debug!("Ignoring unknown frame type {:?}", kind);
            Vec::new()
        }
    }
}
