//! Studio engine: chat stream transport, backend lookups and bundle persistence.
mod api;
mod client;
mod decode;
mod engine;
mod persist;
mod types;

pub use api::{resolve_session, BackendApi};
pub use client::{ChatTransport, ClientSettings, EventSink, ReqwestClient};
pub use decode::{is_done_line, LineDecoder};
pub use engine::{EngineError, EngineHandle};
pub use persist::{ensure_output_dir, write_bundle, AtomicFileWriter, PersistError};
pub use types::{
    ApiError, ArtifactFiles, ArtifactRecord, ChatTurn, EngineEvent, FailureKind, FileRecord,
    MessageRecord, ResolvedArtifact, ResolvedSession, SessionRecord, StreamError, StreamId,
    StreamSummary,
};
