//! Central configuration constants for tracking limits and defaults.

/// Server the CLI talks to when neither `--server` nor `PIPEWATCH_SERVER` is set.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Interval between snapshot fetches while a task is being tracked (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Minimum allowed snapshot poll interval (milliseconds).
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Maximum allowed snapshot poll interval (milliseconds).
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Capacity of the channel shared by the stream and poll producers.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Worker order used when a submission does not name its own pipeline.
pub const DEFAULT_PIPELINE: [&str; 4] = ["Planner", "Researcher", "Writer", "Reviewer"];

/// Name of the optional final review stage.
pub const REVIEW_STAGE: &str = "Reviewer";

/// Convenience function to clamp a poll interval into the allowed range.
pub fn clamp_poll_interval_ms(v: u64) -> u64 {
    v.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS)
}

/// The default pipeline as owned worker names.
pub fn default_pipeline() -> Vec<String> {
    DEFAULT_PIPELINE.iter().map(|s| s.to_string()).collect()
}
