use std::sync::Arc;
use std::time::Duration;

use pipewatch_config::{clamp_poll_interval_ms, DEFAULT_POLL_INTERVAL_MS, EVENT_CHANNEL_CAPACITY};
use pipewatch_core::TaskId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app_core::{reduce, SessionMessage, Update};
use crate::ingest::StreamSubscription;
use crate::poller::PollHandle;
use crate::ports::{EventSource, SnapshotSource};
use crate::session::{SessionId, TrackingState};
use crate::viewmodel::TrackingView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub channel_capacity: usize,
}

impl TrackerConfig {
    pub fn with_poll_interval_ms(ms: u64) -> Self {
        Self {
            poll_interval: Duration::from_millis(clamp_poll_interval_ms(ms)),
            ..Self::default()
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

struct Session {
    state: TrackingState,
    cancel: CancellationToken,
    _stream: StreamSubscription,
    _poller: PollHandle,
}

/// Tracks at most one task at a time.
///
/// The stream and poll producers run as Tokio tasks and report over one
/// channel; all state changes happen on the caller's side in [`tick`] or
/// [`next_update`], so nothing here needs a lock.
///
/// [`tick`]: TaskTracker::tick
/// [`next_update`]: TaskTracker::next_update
pub struct TaskTracker<E, S> {
    events: Arc<E>,
    snapshots: Arc<S>,
    config: TrackerConfig,
    session: Option<Session>,

    tx: mpsc::Sender<SessionMessage>,
    rx: mpsc::Receiver<SessionMessage>,
}

impl<E, S> TaskTracker<E, S>
where
    E: EventSource,
    S: SnapshotSource,
{
    pub fn new(events: Arc<E>, snapshots: Arc<S>, config: TrackerConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        Self {
            events,
            snapshots,
            config,
            session: None,
            tx,
            rx,
        }
    }

    /// Start tracking `task_id`, tearing down whatever was tracked before.
    ///
    /// Every worker in `pipeline` starts `pending`. Must be called from within
    /// a Tokio runtime.
    pub fn track(&mut self, task_id: impl Into<TaskId>, pipeline: Vec<String>) -> SessionId {
        self.stop();

        let task_id = task_id.into();
        let session_id: SessionId = uuid::Uuid::new_v4();
        let cancel = CancellationToken::new();

        let stream = StreamSubscription::open(
            self.events.clone(),
            task_id.clone(),
            session_id,
            self.tx.clone(),
            cancel.child_token(),
        );
        let poller = PollHandle::start(
            self.snapshots.clone(),
            task_id.clone(),
            self.config.poll_interval,
            session_id,
            self.tx.clone(),
            cancel.child_token(),
        );

        info!(%task_id, %session_id, workers = pipeline.len(), "tracking task");
        self.session = Some(Session {
            state: TrackingState::new(session_id, task_id, pipeline),
            cancel,
            _stream: stream,
            _poller: poller,
        });
        session_id
    }

    /// Close the stream, stop polling and discard derived state.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            info!(task_id = %session.state.task_id, session_id = %session.state.session_id, "tracking stopped");
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.state.session_id)
    }

    pub fn state(&self) -> Option<&TrackingState> {
        self.session.as_ref().map(|s| &s.state)
    }

    pub fn view(&self) -> Option<TrackingView> {
        self.state().map(TrackingView::from_state)
    }

    /// Apply one message. `None` when it belongs to another session.
    pub fn apply(&mut self, msg: SessionMessage) -> Option<Update> {
        let session = self.session.as_mut()?;
        if session.state.session_id != msg.session_id {
            debug!(stale = %msg.session_id, "dropping message from a previous session");
            return None;
        }
        Some(reduce(&mut session.state, msg.ev))
    }

    /// Drain everything already queued without waiting.
    pub fn tick(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            if let Some(update) = self.apply(msg) {
                updates.push(update);
            }
        }
        updates
    }

    /// Wait for the next update of the current session.
    ///
    /// Returns `None` immediately when nothing is being tracked.
    pub async fn next_update(&mut self) -> Option<Update> {
        while self.session.is_some() {
            let msg = self.rx.recv().await?;
            if let Some(update) = self.apply(msg) {
                return Some(update);
            }
        }
        None
    }

    pub fn sender(&self) -> mpsc::Sender<SessionMessage> {
        self.tx.clone()
    }
}

impl<E, S> Drop for TaskTracker<E, S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
        }
    }
}
