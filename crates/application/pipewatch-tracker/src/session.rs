use pipewatch_core::{AgentBoard, PipelineStatusTracker, TaskId, TaskSnapshot, TaskStatus};

use crate::ingest::StreamIngestor;

/// Identifies one tracking session. Messages tagged with any other id are stale.
pub type SessionId = uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamHealth {
    #[default]
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    pub latest: Option<TaskStatus>,
    /// Published at most once per session.
    pub final_snapshot: Option<TaskSnapshot>,
    pub fetches: u32,
    pub failures: u32,
}

/// Everything derived for the task currently being tracked.
#[derive(Debug, Clone)]
pub struct TrackingState {
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub pipeline: Vec<String>,
    pub ingestor: StreamIngestor,
    pub agents: AgentBoard,
    pub status: PipelineStatusTracker,
    pub stream: StreamHealth,
    pub poll: PollState,
}

impl TrackingState {
    pub fn new(session_id: SessionId, task_id: TaskId, pipeline: Vec<String>) -> Self {
        Self {
            session_id,
            ingestor: StreamIngestor::new(&pipeline),
            agents: AgentBoard::pending(&pipeline),
            task_id,
            pipeline,
            status: PipelineStatusTracker::new(),
            stream: StreamHealth::Connecting,
            poll: PollState::default(),
        }
    }

    /// The stream reported a terminal status, or the final snapshot was published.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal() || self.poll.final_snapshot.is_some()
    }
}
