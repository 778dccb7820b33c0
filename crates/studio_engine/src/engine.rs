use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use studio_logging::{studio_info, studio_warn};

use crate::api::{resolve_artifact, resolve_session, BackendApi};
use crate::client::{ChannelEventSink, ChatTransport, ClientSettings, EventSink, ReqwestClient};
use crate::{ApiError, ChatTurn, EngineEvent, StreamId};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] ApiError),
}

enum EngineCommand {
    StartStream { stream_id: StreamId, turn: ChatTurn },
    LoadSession { session_id: String },
    LoadArtifact { artifact_id: String },
}

/// Runs network work on a background runtime and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    next_stream_id: AtomicU64,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let client = ReqwestClient::new(settings)?;
        Self::with_client(client)
    }

    pub fn with_client<C>(client: C) -> Result<Self, EngineError>
    where
        C: ChatTransport + BackendApi + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let client = Arc::new(client);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(client.as_ref(), command, event_tx).await;
                });
            }
            studio_info!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            next_stream_id: AtomicU64::new(1),
        })
    }

    /// Start streaming a chat turn. Lines arrive as [`EngineEvent::StreamLine`].
    pub fn start_stream(&self, turn: ChatTurn) -> StreamId {
        let stream_id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        self.send(EngineCommand::StartStream { stream_id, turn });
        stream_id
    }

    pub fn load_session(&self, session_id: impl Into<String>) {
        self.send(EngineCommand::LoadSession {
            session_id: session_id.into(),
        });
    }

    pub fn load_artifact(&self, artifact_id: impl Into<String>) {
        self.send(EngineCommand::LoadArtifact {
            artifact_id: artifact_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            studio_warn!("Engine worker is gone; command dropped");
        }
    }
}

async fn handle_command<C>(client: &C, command: EngineCommand, event_tx: mpsc::Sender<EngineEvent>)
where
    C: ChatTransport + BackendApi,
{
    match command {
        EngineCommand::StartStream { stream_id, turn } => {
            let sink = ChannelEventSink::new(event_tx);
            let event = match client.stream_chat(stream_id, &turn, &sink).await {
                Ok(summary) => EngineEvent::StreamFinished { stream_id, summary },
                Err(error) => {
                    studio_warn!("Stream {} failed: {}", stream_id, error);
                    EngineEvent::StreamFailed { stream_id, error }
                }
            };
            sink.emit(event);
        }
        EngineCommand::LoadSession { session_id } => {
            let result = resolve_session(client, &session_id).await;
            let _ = event_tx.send(EngineEvent::SessionResolved { session_id, result });
        }
        EngineCommand::LoadArtifact { artifact_id } => {
            let result = resolve_artifact(client, &artifact_id).await;
            let _ = event_tx.send(EngineEvent::ArtifactResolved {
                artifact_id,
                result,
            });
        }
    }
}
