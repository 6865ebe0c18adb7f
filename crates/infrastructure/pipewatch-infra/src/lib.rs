pub mod net;

// Re-exports for convenience
pub use net::sse::{data_stream, SseDecoder};
pub use net::{default_http_client, ApiError, TaskApiClient};
