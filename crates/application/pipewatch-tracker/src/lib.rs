pub mod app_core;
pub mod error;
pub mod http;
pub mod ingest;
pub mod kernel;
pub mod poller;
pub mod ports;
pub mod session;
pub mod viewmodel;

pub use app_core::*;
pub use error::TrackError;
pub use ingest::{Ingested, StreamIngestor, StreamSubscription};
pub use kernel::{TaskTracker, TrackerConfig};
pub use poller::PollHandle;
pub use ports::{EventSource, FrameStream, SnapshotSource};
pub use session::{PollState, SessionId, StreamHealth, TrackingState};
pub use viewmodel::{AgentRow, DetailEntry, TrackingView};
