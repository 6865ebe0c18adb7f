use pipewatch_infra::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("event source error: {0}")]
    Source(String),
}

impl TrackError {
    /// Expected hiccups while a task is running (server busy, task not stored yet).
    pub fn is_transient(&self) -> bool {
        match self {
            TrackError::Api(e) => e.is_transient(),
            TrackError::Source(_) => false,
        }
    }
}
