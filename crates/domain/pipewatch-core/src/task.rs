use serde::{Deserialize, Serialize};

use crate::TaskId;

/// Shown when a task failed without an error message.
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Unknown error occurred during pipeline execution.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-worker output map, opaque to this client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_output: Option<serde_json::Value>,
}

/// Point-in-time read of a task run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    #[serde(default)]
    pub id: TaskId,
    #[serde(default)]
    pub prompt: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed { final_report: Option<String> },
    Failed { error: String },
}

impl TaskSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Terminal result; `None` while the task is still pending or running.
    pub fn outcome(&self) -> Option<TaskOutcome> {
        match self.status {
            TaskStatus::Completed => Some(TaskOutcome::Completed {
                final_report: self.result.as_ref().and_then(|r| r.final_report.clone()),
            }),
            TaskStatus::Failed => Some(TaskOutcome::Failed {
                error: self
                    .result
                    .as_ref()
                    .and_then(|r| r.error.clone())
                    .unwrap_or_else(|| UNKNOWN_FAILURE_MESSAGE.to_string()),
            }),
            TaskStatus::Pending | TaskStatus::InProgress => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub pipeline: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub prompt: String,
    pub config: PipelineConfig,
}

impl CreateTaskRequest {
    pub fn new(prompt: impl Into<String>, pipeline: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            config: PipelineConfig { pipeline },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResponse {
    pub task_id: TaskId,
}
