use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::bundle::{BundleMerger, FileBundle};
use crate::effect::{ChatRequest, Effect};
use crate::frame::ProgressInfo;
use crate::gate::ReadinessGate;
use crate::session::{ArtifactSnapshot, SessionContext, SessionSnapshot};
use crate::transcript::{split_thinking, Transcript};
use crate::view_model::{AppViewModel, MessageView};

/// Minimum spacing between bundle updates sent to the preview.
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_millis(100);

/// State of one chat/preview pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    transcript: Transcript,
    merger: BundleMerger,
    gate: ReadinessGate<FileBundle>,
    context: SessionContext,
    progress: Option<ProgressInfo>,
    dataset_id: Option<String>,
    streaming: bool,
    loading_session: Option<String>,
    loading_artifact: Option<String>,
    latest_bundle: FileBundle,
    visible: Option<FileBundle>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_emit_interval(DEFAULT_EMIT_INTERVAL)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emit_interval(interval: Duration) -> Self {
        Self {
            transcript: Transcript::new(),
            merger: BundleMerger::new(interval),
            gate: ReadinessGate::new(),
            context: SessionContext::default(),
            progress: None,
            dataset_id: None,
            streaming: false,
            loading_session: None,
            loading_artifact: None,
            latest_bundle: FileBundle::new(),
            visible: None,
            dirty: false,
        }
    }

    /// Resume a previously persisted session context.
    pub fn with_context(mut self, context: SessionContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_loading(&self) -> bool {
        self.loading_session.is_some() || self.loading_artifact.is_some()
    }

    /// The preview shows the latest bundle, or there is nothing to show.
    pub fn is_preview_settled(&self) -> bool {
        self.latest_bundle.is_empty() || self.visible.as_ref() == Some(&self.latest_bundle)
    }

    pub fn view(&self) -> AppViewModel {
        let messages = self
            .transcript
            .messages()
            .iter()
            .map(|message| {
                let rendered = split_thinking(&message.content);
                MessageView {
                    id: message.id,
                    role: message.role,
                    body: rendered.body,
                    thinking: rendered.thinking,
                    status: message.status,
                    timestamp: message.timestamp,
                }
            })
            .collect();

        AppViewModel {
            session_id: self.context.session_id.clone(),
            base_artifact_id: self.context.base_artifact_id.clone(),
            messages,
            progress: self.progress.clone(),
            streaming: self.streaming,
            loading: self.is_loading(),
            bundle: self.latest_bundle.clone(),
            preview: self.visible.clone(),
            sandbox_ready: self.gate.is_ready(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn start_turn(&mut self, content: String, at: DateTime<Utc>) -> ChatRequest {
        self.transcript.push_user(content.clone(), at);
        self.transcript.begin_reply(at);
        self.merger.begin_artifact();
        self.progress = None;
        self.streaming = true;
        self.mark_dirty();
        ChatRequest {
            content,
            session_id: self.context.session_id.clone(),
            base_artifact_id: self.context.base_artifact_id.clone(),
            dataset_id: self.dataset_id.clone(),
        }
    }

    pub(crate) fn adopt_session(&mut self, session_id: &str) -> Option<Effect> {
        if !self.context.adopt_session(session_id) {
            return None;
        }
        self.mark_dirty();
        Some(Effect::SessionContextChanged(self.context.clone()))
    }

    pub(crate) fn begin_artifact(&mut self) {
        self.transcript.ensure_thinking_closed();
        self.merger.begin_artifact();
        self.mark_dirty();
    }

    pub(crate) fn apply_file_delta(&mut self, path: &str, code: &str, now: Instant) -> Vec<Effect> {
        self.transcript.ensure_thinking_closed();
        self.mark_dirty();
        match self.merger.apply_delta(path, code, now) {
            Some(bundle) => self.present(bundle),
            None => Vec::new(),
        }
    }

    pub(crate) fn end_artifact(&mut self, artifact_id: Option<&str>, now: Instant) -> Vec<Effect> {
        self.transcript.ensure_thinking_closed();
        self.mark_dirty();
        let bundle = self.merger.commit(now);
        let mut effects = Vec::new();
        if self.context.adopt_artifact(artifact_id) {
            effects.push(Effect::SessionContextChanged(self.context.clone()));
        }
        effects.extend(self.present(bundle));
        effects
    }

    pub(crate) fn set_progress(&mut self, progress: ProgressInfo) {
        self.progress = Some(progress);
        self.mark_dirty();
    }

    pub(crate) fn append_thinking(&mut self, delta: &str) {
        self.transcript.append_thinking(delta);
        self.mark_dirty();
    }

    pub(crate) fn append_message(&mut self, delta: &str) {
        self.transcript.append_message(delta);
        self.mark_dirty();
    }

    pub(crate) fn record_stream_error(&mut self, error: &str) {
        let at = self
            .transcript
            .messages()
            .last()
            .map(|message| message.timestamp)
            .unwrap_or_else(Utc::now);
        self.transcript.record_error(error, at);
        self.mark_dirty();
    }

    pub(crate) fn finish_stream(&mut self, now: Instant) -> Vec<Effect> {
        if !self.streaming {
            return Vec::new();
        }
        self.transcript.finish_reply();
        self.close_stream(now)
    }

    pub(crate) fn fail_stream(
        &mut self,
        error: &str,
        at: DateTime<Utc>,
        now: Instant,
    ) -> Vec<Effect> {
        if !self.streaming {
            return Vec::new();
        }
        self.transcript.fail_reply(error, at);
        self.close_stream(now)
    }

    pub(crate) fn flush_throttled(&mut self, now: Instant) -> Vec<Effect> {
        match self.merger.poll(now) {
            Some(bundle) => {
                self.mark_dirty();
                self.present(bundle)
            }
            None => Vec::new(),
        }
    }

    /// Returns `false` when this session is already being fetched.
    ///
    /// Switching to another session drops the previous session's bundle.
    pub(crate) fn begin_session_load(&mut self, session_id: &str) -> (bool, Vec<Effect>) {
        if self.loading_session.as_deref() == Some(session_id) {
            return (false, Vec::new());
        }
        self.loading_session = Some(session_id.to_string());
        self.mark_dirty();
        if !self.context.switch_to(session_id) {
            return (true, Vec::new());
        }
        let mut effects = vec![Effect::SessionContextChanged(self.context.clone())];
        effects.extend(self.clear_bundle());
        (true, effects)
    }

    /// Returns `false` for a result that no longer matches the pending load.
    pub(crate) fn finish_session_load(&mut self, session_id: &str) -> bool {
        if self.loading_session.as_deref() != Some(session_id) {
            return false;
        }
        self.loading_session = None;
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_session(&mut self, snapshot: Option<SessionSnapshot>) -> Vec<Effect> {
        let Some(snapshot) = snapshot else {
            self.transcript.replace(Vec::new());
            return Vec::new();
        };
        self.transcript.replace(snapshot.messages);
        match snapshot.artifact {
            Some(artifact) => self.apply_artifact(artifact),
            None => Vec::new(),
        }
    }

    pub(crate) fn begin_artifact_load(&mut self, artifact_id: &str) -> bool {
        if self.loading_artifact.as_deref() == Some(artifact_id) {
            return false;
        }
        self.loading_artifact = Some(artifact_id.to_string());
        self.mark_dirty();
        true
    }

    pub(crate) fn finish_artifact_load(&mut self, artifact_id: &str) -> bool {
        if self.loading_artifact.as_deref() != Some(artifact_id) {
            return false;
        }
        self.loading_artifact = None;
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_artifact(&mut self, artifact: ArtifactSnapshot) -> Vec<Effect> {
        self.merger.replace(artifact.files.clone());
        self.mark_dirty();
        let mut effects = Vec::new();
        if self.context.adopt_artifact(Some(&artifact.artifact_id)) {
            effects.push(Effect::SessionContextChanged(self.context.clone()));
        }
        effects.extend(self.present(artifact.files));
        effects
    }

    pub(crate) fn sandbox_ready(&mut self) -> Vec<Effect> {
        self.mark_dirty();
        match self.gate.mark_ready() {
            Some(bundle) => vec![self.show(bundle)],
            None => Vec::new(),
        }
    }

    pub(crate) fn set_dataset(&mut self, dataset_id: Option<String>) {
        self.dataset_id = dataset_id;
    }

    fn close_stream(&mut self, now: Instant) -> Vec<Effect> {
        self.streaming = false;
        self.progress = None;
        self.mark_dirty();
        match self.merger.flush_pending(now) {
            Some(bundle) => self.present(bundle),
            None => Vec::new(),
        }
    }

    fn clear_bundle(&mut self) -> Vec<Effect> {
        self.merger.replace(FileBundle::new());
        let shown = self.visible.as_ref().is_some_and(|bundle| !bundle.is_empty());
        if self.latest_bundle.is_empty() && !shown {
            return Vec::new();
        }
        self.present(FileBundle::new())
    }

    /// Route an emitted bundle through the readiness gate.
    fn present(&mut self, bundle: FileBundle) -> Vec<Effect> {
        self.latest_bundle = bundle.clone();
        match self.gate.submit(bundle) {
            Some(bundle) => vec![self.show(bundle)],
            None => Vec::new(),
        }
    }

    fn show(&mut self, bundle: FileBundle) -> Effect {
        self.visible = Some(bundle.clone());
        Effect::ShowPreview(bundle)
    }
}
