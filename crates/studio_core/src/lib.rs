//! Studio core: pure state machine for streamed artifact assembly.
mod bundle;
mod effect;
mod emitter;
mod frame;
mod gate;
mod msg;
mod session;
mod state;
mod transcript;
mod update;
mod view_model;

pub use bundle::{normalize_path, BundleMerger, FileBundle};
pub use effect::{ChatRequest, Effect};
pub use emitter::CoalescingEmitter;
pub use frame::{interpret_line, interpret_payload, Frame, ProgressInfo, DONE_SENTINEL};
pub use gate::ReadinessGate;
pub use msg::Msg;
pub use session::{ArtifactSnapshot, HistoryEntry, SessionContext, SessionSnapshot};
pub use state::{AppState, DEFAULT_EMIT_INTERVAL};
pub use transcript::{
    next_phase, split_thinking, ChatMessage, MessageId, MessageStatus, RenderedContent,
    ReplyInput, Role, ThinkingPhase, ThinkingRegion, Transcript, THINKING_CLOSE, THINKING_OPEN,
};
pub use update::update;
pub use view_model::{AppViewModel, MessageView};
