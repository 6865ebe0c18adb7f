use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use tracing::debug;

use super::ApiError;

/// Incremental `text/event-stream` decoder.
///
/// Yields the joined `data:` payload of every completed message. Other
/// fields (`event:`, `id:`, `retry:`) and comment lines are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the payloads it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(msg) = self.process_line(line) {
                out.push(msg);
            }
        }
        out
    }

    /// End of stream. A trailing message without its blank line is still delivered.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buf.is_empty() {
            let raw = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\r').to_string();
            if let Some(msg) = self.process_line(&line) {
                return Some(msg);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        } else {
            debug!(field, "ignoring sse field");
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let msg = self.data.join("\n");
        self.data.clear();
        Some(msg)
    }
}

struct DataStreamState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    done: bool,
    url: String,
}

/// Turn a raw body stream into a stream of SSE data payloads.
///
/// A transport error is yielded once and ends the stream.
pub fn data_stream<S, B>(bytes: S, url: String) -> impl Stream<Item = Result<String, ApiError>> + Send
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send,
{
    let state = DataStreamState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        done: false,
        url,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(msg) = st.ready.pop_front() {
                return Some((Ok(msg), st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let completed = st.decoder.push(chunk.as_ref());
                    st.ready.extend(completed);
                }
                Some(Err(source)) => {
                    st.done = true;
                    let err = ApiError::Request {
                        url: st.url.clone(),
                        source,
                    };
                    return Some((Err(err), st));
                }
                None => {
                    st.done = true;
                    let tail = st.decoder.finish();
                    st.ready.extend(tail);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_split_across_chunks_is_reassembled() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: {\"id\":").is_empty());
        assert!(dec.push(b"\"1\"}\n").is_empty());
        assert_eq!(dec.push(b"\n"), vec![r#"{"id":"1"}"#.to_string()]);
    }

    #[test]
    fn crlf_comments_and_other_fields() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b": keep-alive\r\nevent: progress\r\nid: 7\r\ndata: a\r\ndata: b\r\n\r\n");
        assert_eq!(out, vec!["a\nb".to_string()]);
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"\n\n\n").is_empty());
        assert!(dec.finish().is_none());
    }

    #[test]
    fn trailing_message_is_flushed_on_finish() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: last").is_empty());
        assert_eq!(dec.finish().as_deref(), Some("last"));
    }
}
