//! The orchestrator's HTTP API as both tracking sources.

use futures::StreamExt;
use pipewatch_core::TaskSnapshot;
use pipewatch_infra::TaskApiClient;

use crate::error::TrackError;
use crate::ports::{EventSource, FrameStream, SnapshotSource};

#[async_trait::async_trait]
impl EventSource for TaskApiClient {
    async fn subscribe(&self, task_id: &str) -> Result<FrameStream, TrackError> {
        let frames = self.open_events(task_id).await?;
        Ok(frames.map(|r| r.map_err(TrackError::from)).boxed())
    }
}

#[async_trait::async_trait]
impl SnapshotSource for TaskApiClient {
    async fn fetch_snapshot(&self, task_id: &str) -> Result<TaskSnapshot, TrackError> {
        Ok(self.fetch_task(task_id).await?)
    }
}
