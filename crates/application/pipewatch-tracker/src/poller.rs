//! Periodic snapshot fetches until the task reaches a terminal status.

use std::sync::Arc;
use std::time::Duration;

use pipewatch_core::TaskId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app_core::{SessionEvent, SessionMessage};
use crate::ports::SnapshotSource;
use crate::session::SessionId;

/// Running poll loop for one session. Dropping it stops polling.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollHandle {
    /// The first fetch is issued immediately. Must be called from within a Tokio runtime.
    pub fn start<S: SnapshotSource>(
        source: Arc<S>,
        task_id: TaskId,
        every: Duration,
        session_id: SessionId,
        tx: mpsc::Sender<SessionMessage>,
        cancel: CancellationToken,
    ) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(%task_id, "polling cancelled");
                }
                _ = poll_until_terminal(source.as_ref(), &task_id, every, session_id, &tx) => {}
            }
        });
        Self { cancel, handle }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// True once a terminal snapshot was delivered or the loop was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_until_terminal<S: SnapshotSource>(
    source: &S,
    task_id: &str,
    every: Duration,
    session_id: SessionId,
    tx: &mpsc::Sender<SessionMessage>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let ev = match source.fetch_snapshot(task_id).await {
            Ok(snap) => {
                if snap.is_terminal() {
                    info!(%task_id, status = %snap.status, "task finished; polling stopped");
                    let _ = tx
                        .send(SessionMessage::new(session_id, SessionEvent::Snapshot(snap)))
                        .await;
                    return;
                }
                debug!(%task_id, status = %snap.status, "snapshot");
                SessionEvent::Snapshot(snap)
            }
            Err(e) => {
                if e.is_transient() {
                    debug!(%task_id, error = %e, "snapshot not available; retrying on next tick");
                } else {
                    warn!(%task_id, error = %e, "snapshot fetch failed; retrying on next tick");
                }
                SessionEvent::SnapshotFailed {
                    message: e.to_string(),
                }
            }
        };
        if tx.send(SessionMessage::new(session_id, ev)).await.is_err() {
            return;
        }
    }
}
