use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pipewatch_core::{AgentStatus, TaskOutcome, TaskResult, TaskSnapshot, TaskStatus};
use pipewatch_tracker::{
    EventSource, FrameStream, PollHandle, SessionId, SnapshotSource, StreamHealth, TaskTracker,
    TrackError, TrackerConfig, Update,
};
use tokio_util::sync::CancellationToken;

struct ScriptedEvents(Vec<&'static str>);

#[async_trait::async_trait]
impl EventSource for ScriptedEvents {
    async fn subscribe(&self, _task_id: &str) -> Result<FrameStream, TrackError> {
        let frames: Vec<Result<String, TrackError>> =
            self.0.iter().map(|f| Ok(f.to_string())).collect();
        Ok(futures::stream::iter(frames).boxed())
    }
}

/// Answers from a fixed script, repeating the last entry. `None` is a failed fetch.
struct ScriptedSnapshots {
    script: Vec<Option<TaskStatus>>,
    calls: AtomicUsize,
}

impl ScriptedSnapshots {
    fn new(script: Vec<Option<TaskStatus>>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SnapshotSource for ScriptedSnapshots {
    async fn fetch_snapshot(&self, task_id: &str) -> Result<TaskSnapshot, TrackError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script[n.min(self.script.len() - 1)];
        let Some(status) = step else {
            return Err(TrackError::Source("connection refused".into()));
        };
        let result = match status {
            TaskStatus::Completed => Some(TaskResult {
                final_report: Some("X".into()),
                ..TaskResult::default()
            }),
            _ => None,
        };
        Ok(TaskSnapshot {
            id: task_id.to_string(),
            prompt: "p".into(),
            status,
            created_at: None,
            updated_at: None,
            result,
        })
    }
}

fn pipeline() -> Vec<String> {
    vec!["Planner".into(), "Researcher".into(), "Writer".into()]
}

async fn run_until_finished<E: EventSource, S: SnapshotSource>(
    tracker: &mut TaskTracker<E, S>,
) -> Vec<Update> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(update) = tracker.next_update().await {
            let done = matches!(update, Update::Finished(_));
            seen.push(update);
            if done {
                break;
            }
        }
    })
    .await
    .expect("tracker did not finish in time");
    seen
}

#[tokio::test]
async fn polling_stops_after_the_terminal_snapshot() {
    let snapshots = Arc::new(ScriptedSnapshots::new(vec![
        Some(TaskStatus::Pending),
        Some(TaskStatus::InProgress),
        Some(TaskStatus::Completed),
    ]));
    let mut tracker = TaskTracker::new(
        Arc::new(ScriptedEvents(vec![])),
        snapshots.clone(),
        TrackerConfig::with_poll_interval_ms(10),
    );
    tracker.track("t1", pipeline());

    let updates = run_until_finished(&mut tracker).await;
    assert!(updates.contains(&Update::Snapshot(TaskStatus::Pending)));
    assert!(updates.contains(&Update::Snapshot(TaskStatus::InProgress)));

    let view = tracker.view().unwrap();
    assert_eq!(
        view.outcome(),
        Some(TaskOutcome::Completed {
            final_report: Some("X".into())
        })
    );
    assert!(view.is_finished());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(snapshots.calls(), 3);
}

#[tokio::test]
async fn failed_fetches_are_retried_on_the_next_tick() {
    let snapshots = Arc::new(ScriptedSnapshots::new(vec![
        None,
        Some(TaskStatus::Failed),
    ]));
    let mut tracker = TaskTracker::new(
        Arc::new(ScriptedEvents(vec![])),
        snapshots.clone(),
        TrackerConfig::with_poll_interval_ms(10),
    );
    tracker.track("t1", pipeline());

    let updates = run_until_finished(&mut tracker).await;
    assert!(updates
        .iter()
        .any(|u| matches!(u, Update::SnapshotFailed(msg) if msg.contains("connection refused"))));

    let view = tracker.view().unwrap();
    assert_eq!(view.snapshot_failures, 1);
    assert_eq!(
        view.outcome(),
        Some(TaskOutcome::Failed {
            error: pipewatch_core::UNKNOWN_FAILURE_MESSAGE.to_string()
        })
    );
}

#[tokio::test]
async fn stream_and_poll_feed_one_view() {
    let events = ScriptedEvents(vec![
        r#"{"id":"1","agentName":"Planner","eventType":"start","message":"planning"}"#,
        r#"{"id":"1","agentName":"Planner","eventType":"start","message":"planning"}"#,
        r#"{"id":"2","agentName":"Planner","eventType":"success","message":"planned"}"#,
        "{oops",
        r#"{"id":"3","agentName":"Researcher","eventType":"start","message":"digging"}"#,
    ]);
    let snapshots = Arc::new(ScriptedSnapshots::new(vec![
        Some(TaskStatus::InProgress),
        Some(TaskStatus::InProgress),
        Some(TaskStatus::InProgress),
        Some(TaskStatus::Completed),
    ]));
    let mut tracker = TaskTracker::new(
        Arc::new(events),
        snapshots,
        TrackerConfig::with_poll_interval_ms(20),
    );
    tracker.track("t1", pipeline());

    let mut closed = false;
    let mut finished = false;
    tokio::time::timeout(Duration::from_secs(5), async {
        while !(closed && finished) {
            match tracker.next_update().await {
                Some(Update::StreamClosed { .. }) => closed = true,
                Some(Update::Finished(_)) => finished = true,
                Some(_) => {}
                None => break,
            }
        }
    })
    .await
    .expect("tracker did not settle");

    let view = tracker.view().unwrap();
    assert_eq!(view.stream, StreamHealth::Closed);
    assert_eq!(view.log_len, 3);
    assert_eq!(view.agent("Planner").unwrap().status, AgentStatus::Done);
    assert_eq!(view.agent("Researcher").unwrap().status, AgentStatus::Running);
    assert_eq!(view.agent("Writer").unwrap().status, AgentStatus::Pending);
    assert_eq!(view.latest_status, Some(TaskStatus::Completed));
}

#[tokio::test]
async fn stopped_poller_issues_no_more_fetches() {
    let snapshots = Arc::new(ScriptedSnapshots::new(vec![Some(TaskStatus::InProgress)]));
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    let poller = PollHandle::start(
        snapshots.clone(),
        "t1".into(),
        Duration::from_millis(10),
        SessionId::new_v4(),
        tx,
        CancellationToken::new(),
    );

    rx.recv().await.unwrap();
    poller.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_stop = snapshots.calls();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(snapshots.calls(), after_stop);
    assert!(poller.is_finished());
}
