use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde_json::json;
use studio_logging::{studio_debug, studio_info};

use crate::api::BackendApi;
use crate::decode::{is_done_line, LineDecoder};
use crate::{
    ApiError, ArtifactRecord, ChatTurn, EngineEvent, FailureKind, SessionRecord, StreamError,
    StreamId, StreamSummary,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to session and artifact lookups, never to the chat stream.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub(crate) struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub(crate) fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one turn and forward every received line to `sink` in order.
    async fn stream_chat(
        &self,
        stream_id: StreamId,
        turn: &ChatTurn,
        sink: &dyn EventSink,
    ) -> Result<StreamSummary, StreamError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    settings: ClientSettings,
    http: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.settings.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Option<T>, ApiError> {
        let response = self
            .http
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_api_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait::async_trait]
impl ChatTransport for ReqwestClient {
    async fn stream_chat(
        &self,
        stream_id: StreamId,
        turn: &ChatTurn,
        sink: &dyn EventSink,
    ) -> Result<StreamSummary, StreamError> {
        let (url, body) = match turn.session_id.as_deref() {
            Some(session_id) => (
                self.endpoint(&["api", "chat", "sessions", session_id, "messages"]),
                json!({
                    "content": turn.content,
                    "base_artifact_id": turn.base_artifact_id,
                }),
            ),
            None => (
                self.endpoint(&["api", "chat"]),
                json!({
                    "messages": [{"role": "user", "content": turn.content}],
                    "session_id": null,
                    "dataset_id": turn.dataset_id,
                }),
            ),
        };
        let url = url.map_err(|err| StreamError::new(FailureKind::InvalidUrl, err.to_string()))?;
        studio_info!("Stream {} POST {}", stream_id, url);

        let response = self
            .http
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(map_stream_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let mut decoder = LineDecoder::new();
        let mut summary = StreamSummary::default();
        let mut chunks = response.bytes_stream();
        'read: while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(map_stream_error)?;
            summary.bytes += chunk.len() as u64;
            for line in decoder.push(&chunk) {
                let done = is_done_line(&line);
                summary.lines += 1;
                sink.emit(EngineEvent::StreamLine { stream_id, line });
                if done {
                    summary.saw_sentinel = true;
                    break 'read;
                }
            }
        }
        if !summary.saw_sentinel {
            if let Some(line) = decoder.finish() {
                summary.saw_sentinel = is_done_line(&line);
                summary.lines += 1;
                sink.emit(EngineEvent::StreamLine { stream_id, line });
            }
        }

        studio_debug!(
            "Stream {} ended lines={} bytes={} sentinel={}",
            stream_id,
            summary.lines,
            summary.bytes,
            summary.saw_sentinel
        );
        Ok(summary)
    }
}

#[async_trait::async_trait]
impl BackendApi for ReqwestClient {
    async fn fetch_session(&self, session_id: &str) -> Result<Option<SessionRecord>, ApiError> {
        let url = self.endpoint(&["api", "chat", "sessions", session_id])?;
        self.get_json(url).await
    }

    async fn fetch_artifact(&self, artifact_id: &str) -> Result<ArtifactRecord, ApiError> {
        let url = self.endpoint(&["api", "artifacts", artifact_id])?;
        self.get_json(url)
            .await?
            .ok_or(ApiError::Http { status: 404 })
    }
}

fn map_stream_error(err: reqwest::Error) -> StreamError {
    if err.is_timeout() {
        return StreamError::new(FailureKind::Timeout, err.to_string());
    }
    StreamError::new(FailureKind::Network, err.to_string())
}

fn map_api_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Transport(err.to_string())
}
