use pipewatch_core::{derive_agent_states, Transition};
use tracing::{info, warn};

use crate::ingest::Ingested;
use crate::session::{StreamHealth, TrackingState};

use super::events::{SessionEvent, Update};

pub fn reduce(state: &mut TrackingState, ev: SessionEvent) -> Update {
    match ev {
        SessionEvent::StreamOpened => {
            state.stream = StreamHealth::Open;
            Update::StreamOpened
        }

        SessionEvent::Frame(payload) => match state.ingestor.ingest(&payload) {
            Ingested::Event(ev) => {
                state.agents = derive_agent_states(&state.pipeline, state.ingestor.log());
                Update::EventLogged(ev)
            }
            Ingested::Duplicate(id) => Update::Duplicate(id),
            Ingested::Malformed(_) => Update::Malformed,
            Ingested::Status(next) => {
                let transition = state.status.apply(next);
                match transition {
                    Transition::Advanced { from, to } => {
                        info!(task_id = %state.task_id, %from, %to, "pipeline status changed");
                    }
                    Transition::Rejected { current, attempted } => {
                        warn!(
                            task_id = %state.task_id,
                            %current,
                            %attempted,
                            "ignoring status update after terminal status"
                        );
                    }
                    Transition::Unchanged => {}
                }
                Update::PipelineStatus(transition)
            }
        },

        SessionEvent::StreamClosed { reason } => {
            state.stream = StreamHealth::Closed;
            Update::StreamClosed { reason }
        }

        SessionEvent::Snapshot(snap) => {
            if state.poll.final_snapshot.is_some() {
                return Update::Ignored;
            }
            state.poll.fetches += 1;
            state.poll.latest = Some(snap.status);
            if snap.is_terminal() {
                info!(task_id = %state.task_id, status = %snap.status, "final snapshot received");
                state.poll.final_snapshot = Some(snap.clone());
                Update::Finished(snap)
            } else {
                Update::Snapshot(snap.status)
            }
        }

        SessionEvent::SnapshotFailed { message } => {
            state.poll.failures += 1;
            Update::SnapshotFailed(message)
        }
    }
}
