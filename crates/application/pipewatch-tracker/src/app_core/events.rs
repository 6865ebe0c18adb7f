use pipewatch_core::{Event, EventId, TaskSnapshot, TaskStatus, Transition};

use crate::session::SessionId;

/// What a producer task observed for the session it was started for.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    // Stream
    StreamOpened,
    Frame(String),
    StreamClosed { reason: Option<String> },

    // Poll
    Snapshot(TaskSnapshot),
    SnapshotFailed { message: String },
}

#[derive(Debug, Clone)]
pub struct SessionMessage {
    pub session_id: SessionId,
    pub ev: SessionEvent,
}

impl SessionMessage {
    pub fn new(session_id: SessionId, ev: SessionEvent) -> Self {
        Self { session_id, ev }
    }
}

/// What applying one message changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    EventLogged(Event),
    Duplicate(EventId),
    Malformed,
    PipelineStatus(Transition),
    StreamOpened,
    StreamClosed { reason: Option<String> },
    Snapshot(TaskStatus),
    Finished(TaskSnapshot),
    SnapshotFailed(String),
    /// A snapshot that arrived after the final one was published.
    Ignored,
}
