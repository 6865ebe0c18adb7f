use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod agent;
pub mod frame;
pub mod status;
pub mod task;

pub use agent::{derive_agent_states, detail_log, AgentBoard, AgentState, AgentStatus};
pub use frame::{decode_frame, FrameError, StreamMessage, STATUS_UPDATE_TYPE};
pub use status::{PipelineStatus, PipelineStatusTracker, Transition};
pub use task::{
    CreateTaskRequest, CreateTaskResponse, PipelineConfig, TaskOutcome, TaskResult, TaskSnapshot,
    TaskStatus, UNKNOWN_FAILURE_MESSAGE,
};

pub type TaskId = String;
pub type EventId = String;

/// Lifecycle kind of a worker-scoped event.
///
/// Kinds the backend may add later are kept verbatim in `Other` so a frame
/// re-encodes exactly as it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Start,
    Info,
    Retry,
    Success,
    Error,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Start => "start",
            EventKind::Info => "info",
            EventKind::Retry => "retry",
            EventKind::Success => "success",
            EventKind::Error => "error",
            EventKind::Other(s) => s,
        }
    }

    /// Status a worker moves to when it receives this kind, if any.
    pub fn status_effect(&self) -> Option<AgentStatus> {
        match self {
            EventKind::Start => Some(AgentStatus::Running),
            EventKind::Success => Some(AgentStatus::Done),
            EventKind::Retry => Some(AgentStatus::Retrying),
            EventKind::Error => Some(AgentStatus::Error),
            EventKind::Info | EventKind::Other(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "start" => EventKind::Start,
            "info" => EventKind::Info,
            "retry" => EventKind::Retry,
            "success" => EventKind::Success,
            "error" => EventKind::Error,
            _ => EventKind::Other(value),
        }
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        match value {
            EventKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation emitted by the orchestrator for a single task run.
///
/// Re-encoding is lossless for the fields listed here only: unrecognized
/// wire fields are dropped and a missing `message` comes back as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub agent_name: String,
    pub event_type: EventKind,
    #[serde(default)]
    pub message: String,
    // Kept as sent; the backend emits naive ISO timestamps without an offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<EventId>,
        agent_name: impl Into<String>,
        event_type: EventKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            task_id: None,
            agent_name: agent_name.into(),
            event_type,
            message: message.into(),
            created_at: None,
            details: None,
        }
    }

    /// Emission time, read as UTC when the wire value carries no offset.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
