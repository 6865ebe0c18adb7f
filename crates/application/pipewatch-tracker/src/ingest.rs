//! Stream ingestion: raw payloads in, an ordered duplicate-free event log out.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use pipewatch_core::{decode_frame, Event, EventId, FrameError, PipelineStatus, StreamMessage, TaskId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app_core::{SessionEvent, SessionMessage};
use crate::ports::EventSource;
use crate::session::SessionId;

#[derive(Debug)]
pub enum Ingested {
    Event(Event),
    Status(PipelineStatus),
    Duplicate(EventId),
    Malformed(FrameError),
}

/// Append-only log of accepted events for one session.
///
/// An id is accepted at most once; order is arrival order.
#[derive(Debug, Clone, Default)]
pub struct StreamIngestor {
    workers: HashSet<String>,
    seen: HashSet<EventId>,
    log: Vec<Event>,
}

impl StreamIngestor {
    pub fn new(pipeline: &[String]) -> Self {
        Self {
            workers: pipeline.iter().cloned().collect(),
            seen: HashSet::new(),
            log: Vec::new(),
        }
    }

    pub fn ingest(&mut self, payload: &str) -> Ingested {
        match decode_frame(payload) {
            Ok(StreamMessage::Event(ev)) => self.accept(ev),
            Ok(StreamMessage::Status(status)) => Ingested::Status(status),
            Err(e) => {
                warn!(error = %e, "discarding malformed frame");
                Ingested::Malformed(e)
            }
        }
    }

    pub fn accept(&mut self, ev: Event) -> Ingested {
        if self.seen.contains(&ev.id) {
            debug!(id = %ev.id, "duplicate event dropped");
            return Ingested::Duplicate(ev.id);
        }
        if !self.workers.contains(&ev.agent_name) {
            warn!(id = %ev.id, agent = %ev.agent_name, "event for a worker outside the pipeline");
        }
        if !ev.event_type.is_known() {
            warn!(id = %ev.id, kind = %ev.event_type, "unrecognized event type");
        }
        self.seen.insert(ev.id.clone());
        self.log.push(ev.clone());
        Ingested::Event(ev)
    }

    pub fn log(&self) -> &[Event] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

/// Live subscription to one task's event stream.
///
/// Forwards raw payloads to the session channel until the transport ends or
/// the subscription is closed. Dropping it closes it.
#[derive(Debug)]
pub struct StreamSubscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StreamSubscription {
    /// Must be called from within a Tokio runtime.
    pub fn open<E: EventSource>(
        source: Arc<E>,
        task_id: TaskId,
        session_id: SessionId,
        tx: mpsc::Sender<SessionMessage>,
        cancel: CancellationToken,
    ) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(%task_id, "event subscription closed");
                }
                _ = pump_frames(source.as_ref(), &task_id, session_id, &tx) => {}
            }
        });
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Idempotent.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.handle = None;
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn emit(tx: &mpsc::Sender<SessionMessage>, session_id: SessionId, ev: SessionEvent) -> bool {
    tx.send(SessionMessage::new(session_id, ev)).await.is_ok()
}

async fn pump_frames<E: EventSource>(
    source: &E,
    task_id: &str,
    session_id: SessionId,
    tx: &mpsc::Sender<SessionMessage>,
) {
    let mut frames = match source.subscribe(task_id).await {
        Ok(frames) => frames,
        Err(e) => {
            warn!(%task_id, error = %e, "could not open event stream");
            let reason = Some(e.to_string());
            emit(tx, session_id, SessionEvent::StreamClosed { reason }).await;
            return;
        }
    };
    if !emit(tx, session_id, SessionEvent::StreamOpened).await {
        return;
    }

    let reason = loop {
        match frames.next().await {
            Some(Ok(payload)) => {
                // Receiver gone: the tracker was dropped.
                if !emit(tx, session_id, SessionEvent::Frame(payload)).await {
                    return;
                }
            }
            Some(Err(e)) => {
                warn!(%task_id, error = %e, "event stream failed");
                break Some(e.to_string());
            }
            None => {
                info!(%task_id, "event stream ended");
                break None;
            }
        }
    };
    emit(tx, session_id, SessionEvent::StreamClosed { reason }).await;
}
