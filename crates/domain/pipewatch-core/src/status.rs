use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::frame::FrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::InProgress => "in_progress",
            PipelineStatus::Completed => "completed",
            PipelineStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Completed | PipelineStatus::Failed)
    }
}

impl FromStr for PipelineStatus {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(PipelineStatus::InProgress),
            "completed" => Ok(PipelineStatus::Completed),
            "failed" => Ok(PipelineStatus::Failed),
            other => Err(FrameError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced {
        from: PipelineStatus,
        to: PipelineStatus,
    },
    Unchanged,
    /// A terminal status was already latched; the update is ignored.
    Rejected {
        current: PipelineStatus,
        attempted: PipelineStatus,
    },
}

/// Pipeline-wide status driven only by `STATUS_UPDATE` frames.
///
/// `in_progress` -> `completed` | `failed`. The first terminal status wins
/// for the rest of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStatusTracker {
    status: PipelineStatus,
}

impl PipelineStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn apply(&mut self, next: PipelineStatus) -> Transition {
        if self.status.is_terminal() {
            if next == self.status {
                return Transition::Unchanged;
            }
            return Transition::Rejected {
                current: self.status,
                attempted: next,
            };
        }
        if next == self.status {
            return Transition::Unchanged;
        }
        let from = self.status;
        self.status = next;
        Transition::Advanced { from, to: next }
    }
}
