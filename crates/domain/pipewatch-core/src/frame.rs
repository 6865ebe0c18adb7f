use serde_json::Value;

use crate::status::PipelineStatus;
use crate::Event;

/// `type` value that marks a pipeline-wide status frame.
pub const STATUS_UPDATE_TYPE: &str = "STATUS_UPDATE";

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unknown pipeline status `{0}`")]
    UnknownStatus(String),
}

/// One decoded stream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    Event(Event),
    Status(PipelineStatus),
}

impl StreamMessage {
    pub fn to_json(&self) -> Result<String, FrameError> {
        let text = match self {
            StreamMessage::Event(ev) => serde_json::to_string(ev)?,
            StreamMessage::Status(status) => serde_json::to_string(&serde_json::json!({
                "type": STATUS_UPDATE_TYPE,
                "status": status.as_str(),
            }))?,
        };
        Ok(text)
    }
}

pub fn decode_frame(payload: &str) -> Result<StreamMessage, FrameError> {
    let value: Value = serde_json::from_str(payload)?;

    if value.get("type").and_then(Value::as_str) == Some(STATUS_UPDATE_TYPE) {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingField("status"))?;
        return Ok(StreamMessage::Status(status.parse()?));
    }

    let ev: Event = serde_json::from_value(value)?;
    if ev.id.is_empty() {
        return Err(FrameError::MissingField("id"));
    }
    if ev.agent_name.is_empty() {
        return Err(FrameError::MissingField("agentName"));
    }
    Ok(StreamMessage::Event(ev))
}
