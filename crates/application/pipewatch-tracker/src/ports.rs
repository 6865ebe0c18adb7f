use futures::stream::BoxStream;
use pipewatch_core::TaskSnapshot;

use crate::error::TrackError;

/// Raw text payloads in arrival order. The stream ending means the transport closed.
pub type FrameStream = BoxStream<'static, Result<String, TrackError>>;

#[async_trait::async_trait]
pub trait EventSource: Send + Sync + 'static {
    async fn subscribe(&self, task_id: &str) -> Result<FrameStream, TrackError>;
}

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn fetch_snapshot(&self, task_id: &str) -> Result<TaskSnapshot, TrackError>;
}
