use serde::{Deserialize, Serialize};

use crate::{Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Running,
    Done,
    Retrying,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Running => "running",
            AgentStatus::Done => "done",
            AgentStatus::Retrying => "retrying",
            AgentStatus::Error => "error",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AgentStatus::Running | AgentStatus::Retrying)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    pub name: String,
    pub status: AgentStatus,
    /// Message of the last status-changing event.
    pub message: Option<String>,
}

/// Current status of every configured worker, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentBoard {
    agents: Vec<AgentState>,
}

impl AgentBoard {
    /// Every worker in `pipeline` starts `pending`. Repeated names collapse to one row.
    pub fn pending(pipeline: &[String]) -> Self {
        let mut agents: Vec<AgentState> = Vec::with_capacity(pipeline.len());
        for name in pipeline {
            if agents.iter().any(|a| &a.name == name) {
                continue;
            }
            agents.push(AgentState {
                name: name.clone(),
                status: AgentStatus::Pending,
                message: None,
            });
        }
        Self { agents }
    }

    pub fn get(&self, name: &str) -> Option<&AgentState> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn status_of(&self, name: &str) -> Option<AgentStatus> {
        self.get(name).map(|a| a.status)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentState> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Later events overwrite unconditionally. Workers outside the pipeline are skipped.
    fn apply(&mut self, ev: &Event) {
        let Some(next) = ev.event_type.status_effect() else {
            return;
        };
        if let Some(agent) = self.agents.iter_mut().find(|a| a.name == ev.agent_name) {
            agent.status = next;
            agent.message = Some(ev.message.clone());
        }
    }
}

/// Fold an ordered event log into the current status of each worker.
///
/// Pure: the same pipeline and log always produce the same board, so it is
/// safe to recompute after every append.
pub fn derive_agent_states<'a>(
    pipeline: &[String],
    log: impl IntoIterator<Item = &'a Event>,
) -> AgentBoard {
    let mut board = AgentBoard::pending(pipeline);
    for ev in log {
        board.apply(ev);
    }
    board
}

/// `info` and `retry` entries for one worker, in arrival order.
pub fn detail_log<'a>(log: &'a [Event], agent: &str) -> Vec<&'a Event> {
    log.iter()
        .filter(|ev| ev.agent_name == agent)
        .filter(|ev| matches!(ev.event_type, EventKind::Info | EventKind::Retry))
        .collect()
}
