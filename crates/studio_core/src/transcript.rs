use chrono::{DateTime, Utc};

use crate::session::HistoryEntry;

pub const THINKING_OPEN: &str = "<thinking>";
pub const THINKING_CLOSE: &str = "</thinking>";

pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Streaming,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    /// Message text. Assistant replies may embed a delimited thinking span.
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: Option<MessageStatus>,
}

/// Where the reply under construction stands relative to its thinking span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThinkingPhase {
    #[default]
    Idle,
    Thinking,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyInput {
    Thinking,
    Other,
}

/// Pure transition: next phase plus the delimiter to append, if any.
pub fn next_phase(phase: ThinkingPhase, input: ReplyInput) -> (ThinkingPhase, Option<&'static str>) {
    match (phase, input) {
        (ThinkingPhase::Thinking, ReplyInput::Thinking) => (ThinkingPhase::Thinking, None),
        (ThinkingPhase::Idle | ThinkingPhase::Closed, ReplyInput::Thinking) => {
            (ThinkingPhase::Thinking, Some(THINKING_OPEN))
        }
        (ThinkingPhase::Thinking, ReplyInput::Other) => (ThinkingPhase::Closed, Some(THINKING_CLOSE)),
        (phase, ReplyInput::Other) => (phase, None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveReply {
    id: MessageId,
    phase: ThinkingPhase,
}

/// Ordered chat messages for one session, plus the reply being streamed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    active: Option<ActiveReply>,
    next_id: MessageId,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_replying(&self) -> bool {
        self.active.is_some()
    }

    pub fn thinking_phase(&self) -> Option<ThinkingPhase> {
        self.active.as_ref().map(|reply| reply.phase)
    }

    pub fn push_user(&mut self, content: impl Into<String>, at: DateTime<Utc>) -> MessageId {
        self.push(Role::User, content.into(), at, None)
    }

    /// Open an empty assistant message that streamed text will fill.
    pub fn begin_reply(&mut self, at: DateTime<Utc>) -> MessageId {
        self.finish_reply();
        let id = self.push(Role::Assistant, String::new(), at, Some(MessageStatus::Streaming));
        self.active = Some(ActiveReply {
            id,
            phase: ThinkingPhase::Idle,
        });
        id
    }

    pub fn append_thinking(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        self.advance(ReplyInput::Thinking, delta);
    }

    pub fn append_message(&mut self, delta: &str) {
        self.advance(ReplyInput::Other, delta);
    }

    /// Close an open thinking span. Idempotent.
    pub fn ensure_thinking_closed(&mut self) {
        self.advance(ReplyInput::Other, "");
    }

    pub fn finish_reply(&mut self) {
        self.ensure_thinking_closed();
        if let Some(reply) = self.active.take() {
            if let Some(message) = self.message_mut(reply.id) {
                message.status = Some(MessageStatus::Complete);
            }
        }
    }

    /// End the reply with a transport failure, leaving exactly one error entry.
    pub fn fail_reply(&mut self, error: &str, at: DateTime<Utc>) {
        self.ensure_thinking_closed();
        let Some(reply) = self.active.take() else {
            self.push_error(error, at);
            return;
        };
        let reused = match self.message_mut(reply.id) {
            Some(message) if message.content.is_empty() => {
                message.content = error.to_string();
                message.status = Some(MessageStatus::Error);
                true
            }
            Some(message) => {
                message.status = Some(MessageStatus::Complete);
                false
            }
            None => false,
        };
        if !reused {
            self.push_error(error, at);
        }
    }

    /// Record an error reported inside the stream; the reply stays open.
    pub fn record_error(&mut self, error: &str, at: DateTime<Utc>) {
        self.ensure_thinking_closed();
        self.push_error(error, at);
    }

    /// Replace the whole transcript with fetched history.
    pub fn replace(&mut self, history: Vec<HistoryEntry>) {
        self.messages.clear();
        self.active = None;
        for entry in history {
            self.push(entry.role, entry.content, entry.timestamp, Some(MessageStatus::Complete));
        }
    }

    fn advance(&mut self, input: ReplyInput, text: &str) {
        let Some(reply) = self.active.as_mut() else {
            return;
        };
        let (phase, delimiter) = next_phase(reply.phase, input);
        reply.phase = phase;
        let id = reply.id;
        if delimiter.is_none() && text.is_empty() {
            return;
        }
        if let Some(message) = self.message_mut(id) {
            if let Some(delimiter) = delimiter {
                message.content.push_str(delimiter);
            }
            message.content.push_str(text);
        }
    }

    fn push_error(&mut self, error: &str, at: DateTime<Utc>) {
        self.push(Role::Assistant, error.to_string(), at, Some(MessageStatus::Error));
    }

    fn push(
        &mut self,
        role: Role,
        content: String,
        timestamp: DateTime<Utc>,
        status: Option<MessageStatus>,
    ) -> MessageId {
        self.next_id += 1;
        let id = self.next_id;
        self.messages.push(ChatMessage {
            id,
            role,
            content,
            timestamp,
            status,
        });
        id
    }

    fn message_mut(&mut self, id: MessageId) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().rev().find(|message| message.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingRegion {
    pub text: String,
    /// The span has not been closed yet.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedContent {
    pub body: String,
    pub thinking: Option<ThinkingRegion>,
}

/// Separate delimited thinking spans from the main message body.
pub fn split_thinking(content: &str) -> RenderedContent {
    let mut body = String::new();
    let mut thinking: Option<ThinkingRegion> = None;
    let mut rest = content;

    while let Some(start) = rest.find(THINKING_OPEN) {
        body.push_str(&rest[..start]);
        let inner = &rest[start + THINKING_OPEN.len()..];
        let region = thinking.get_or_insert_with(|| ThinkingRegion {
            text: String::new(),
            active: false,
        });
        match inner.find(THINKING_CLOSE) {
            Some(end) => {
                region.text.push_str(&inner[..end]);
                rest = &inner[end + THINKING_CLOSE.len()..];
            }
            None => {
                region.text.push_str(inner);
                region.active = true;
                rest = "";
            }
        }
    }
    body.push_str(rest);

    RenderedContent { body, thinking }
}
