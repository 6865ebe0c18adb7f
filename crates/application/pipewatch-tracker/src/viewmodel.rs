use chrono::{DateTime, Utc};
use pipewatch_core::{
    detail_log, AgentStatus, EventId, EventKind, PipelineStatus, TaskId, TaskOutcome,
    TaskSnapshot, TaskStatus,
};

use crate::session::{SessionId, StreamHealth, TrackingState};

#[derive(Debug, Clone, PartialEq)]
pub struct DetailEntry {
    pub id: EventId,
    pub kind: EventKind,
    pub message: String,
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentRow {
    pub name: String,
    pub status: AgentStatus,
    pub message: Option<String>,
    /// Informational and retry entries, oldest first.
    pub details: Vec<DetailEntry>,
}

/// Read-only projection of the tracked task for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingView {
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub agents: Vec<AgentRow>,
    pub pipeline_status: PipelineStatus,
    pub stream: StreamHealth,
    pub log_len: usize,
    pub latest_status: Option<TaskStatus>,
    pub final_snapshot: Option<TaskSnapshot>,
    pub snapshot_failures: u32,
}

impl TrackingView {
    pub fn from_state(state: &TrackingState) -> Self {
        let log = state.ingestor.log();
        let agents = state
            .agents
            .iter()
            .map(|a| AgentRow {
                name: a.name.clone(),
                status: a.status,
                message: a.message.clone(),
                details: detail_log(log, &a.name)
                    .into_iter()
                    .map(|ev| DetailEntry {
                        id: ev.id.clone(),
                        kind: ev.event_type.clone(),
                        message: ev.message.clone(),
                        at: ev.created_at_utc(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            session_id: state.session_id,
            task_id: state.task_id.clone(),
            agents,
            pipeline_status: state.status.status(),
            stream: state.stream,
            log_len: log.len(),
            latest_status: state.poll.latest,
            final_snapshot: state.poll.final_snapshot.clone(),
            snapshot_failures: state.poll.failures,
        }
    }

    pub fn agent(&self, name: &str) -> Option<&AgentRow> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn outcome(&self) -> Option<TaskOutcome> {
        self.final_snapshot.as_ref().and_then(TaskSnapshot::outcome)
    }

    pub fn is_finished(&self) -> bool {
        self.pipeline_status.is_terminal() || self.final_snapshot.is_some()
    }
}
