use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use pipewatch_core::{CreateTaskRequest, CreateTaskResponse, TaskSnapshot};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

pub mod sse;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("server rejected request to {url} (HTTP {status}): {message}")]
    Rejected {
        url: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Failures worth retrying on the next tick rather than reporting.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Request { .. } => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 404 || *status == 429,
            _ => false,
        }
    }
}

/// Client shared by every request. No overall timeout: the event stream is long-lived.
pub fn default_http_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("pipewatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ApiError::Client)
}

/// Typed access to the orchestrator's task endpoints.
#[derive(Debug, Clone)]
pub struct TaskApiClient {
    client: Client,
    base: Url,
}

/// Treat the input as a directory base so `/api/...` segments append rather than replace.
fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: "not a base url".into(),
        });
    }
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

impl TaskApiClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            base: normalize_base(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut segs = url.path_segments_mut().map_err(|_| ApiError::InvalidUrl {
                url: self.base.to_string(),
                reason: "cannot mutate url segments".into(),
            })?;
            segs.pop_if_empty();
            segs.extend(segments);
        }
        Ok(url)
    }

    pub fn tasks_url(&self) -> Result<Url, ApiError> {
        self.endpoint(&["api", "tasks"])
    }

    pub fn task_url(&self, task_id: &str) -> Result<Url, ApiError> {
        self.endpoint(&["api", "tasks", task_id])
    }

    pub fn events_url(&self, task_id: &str) -> Result<Url, ApiError> {
        self.endpoint(&["api", "tasks", task_id, "events"])
    }

    pub async fn create_task(
        &self,
        req: &CreateTaskRequest,
    ) -> Result<CreateTaskResponse, ApiError> {
        let url = self.tasks_url()?;
        let resp = self
            .client
            .post(url.clone())
            .timeout(REQUEST_TIMEOUT)
            .json(req)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if status.is_client_error() {
            let message = error_message(resp).await;
            return Err(ApiError::Rejected {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        read_json(&url, resp).await
    }

    pub async fn fetch_task(&self, task_id: &str) -> Result<TaskSnapshot, ApiError> {
        let url = self.task_url(task_id)?;
        let resp = self.get(&url).await?;
        read_json(&url, resp).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskSnapshot>, ApiError> {
        let url = self.tasks_url()?;
        let resp = self.get(&url).await?;
        read_json(&url, resp).await
    }

    /// Open the task's event stream; yields one raw JSON payload per message.
    pub async fn open_events(
        &self,
        task_id: &str,
    ) -> Result<BoxStream<'static, Result<String, ApiError>>, ApiError> {
        let url = self.events_url(task_id)?;
        let resp = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        debug!(%url, "event stream opened");
        Ok(sse::data_stream(resp.bytes_stream(), url.to_string()).boxed())
    }

    async fn get(&self, url: &Url) -> Result<Response, ApiError> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp)
    }
}

async fn read_json<T: DeserializeOwned>(url: &Url, resp: Response) -> Result<T, ApiError> {
    let bytes = resp.bytes().await.map_err(|source| ApiError::Request {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Best effort read of the backend's `{ "error": ... }` body.
async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.bytes().await.unwrap_or_default();
    serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.to_string())
}
