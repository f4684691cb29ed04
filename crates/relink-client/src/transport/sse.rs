//! Server-Sent Events transport (reqwest byte stream).
//!
//! Receive-only: `send` fails with `SendUnsupported`. The response body is
//! parsed incrementally as `text/event-stream`; only `data:` fields carry
//! envelopes, comment lines double as server keep-alives, and the
//! `event:`/`id:`/`retry:` fields are not used by this protocol.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use relink_core::error::{RelinkError, Result};

use super::{Transport, TransportConn, TransportKind};

/// Connection factory for `http://` / `https://` event-stream endpoints.
pub struct SseTransport {
    client: reqwest::Client,
}

impl SseTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for SseTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SseTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::UnidirectionalStream
    }

    async fn open(&self, endpoint: &str) -> Result<Box<dyn TransportConn>> {
        let resp = self
            .client
            .get(endpoint)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| RelinkError::TransportOpen(e.to_string()))?
            .error_for_status()
            .map_err(|e| RelinkError::TransportOpen(e.to_string()))?;
        tracing::debug!(endpoint, "event stream opened");
        Ok(Box::new(SseConn {
            body: resp.bytes_stream().boxed(),
            parser: SseParser::default(),
            ended: false,
        }))
    }
}

struct SseConn {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    parser: SseParser,
    ended: bool,
}

#[async_trait]
impl TransportConn for SseConn {
    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(data) = self.parser.next_event() {
                return Some(Ok(data));
            }
            if self.ended {
                return None;
            }
            match self.body.next().await {
                Some(Ok(chunk)) => self.parser.push(&chunk),
                Some(Err(e)) => return Some(Err(RelinkError::Transport(e.to_string()))),
                // A trailing half-assembled event has no terminator and is dropped.
                None => self.ended = true,
            }
        }
    }

    async fn send(&mut self, _raw: String) -> Result<()> {
        Err(RelinkError::SendUnsupported)
    }

    async fn close(&mut self) {
        // Dropping the body stream aborts the request.
        self.ended = true;
    }
}

/// Incremental `text/event-stream` parser.
///
/// Chunk boundaries fall anywhere, including mid-line; complete events are
/// queued as their joined `data` payloads.
#[derive(Default)]
struct SseParser {
    buf: Vec<u8>,
    data: Vec<String>,
    events: VecDeque<String>,
}

impl SseParser {
    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        // Multi-byte UTF-8 never contains a raw LF byte, so splitting on LF
        // before decoding is safe.
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.handle_line(line.trim_end_matches(['\n', '\r']));
        }
    }

    fn handle_line(&mut self, line: &str) {
        if line.is_empty() {
            // Blank line dispatches the assembled event.
            if !self.data.is_empty() {
                self.events.push_back(self.data.join("\n"));
                self.data.clear();
            }
            return;
        }
        if line.starts_with(':') {
            return; // comment / keep-alive
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
    }

    fn next_event(&mut self) -> Option<String> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(p: &mut SseParser) -> Vec<String> {
        std::iter::from_fn(|| p.next_event()).collect()
    }

    #[test]
    fn single_event() {
        let mut p = SseParser::default();
        p.push(b"data: {\"type\":\"heartbeat\"}\n\n");
        assert_eq!(drain(&mut p), vec![r#"{"type":"heartbeat"}"#]);
    }

    #[test]
    fn event_split_across_chunks() {
        let mut p = SseParser::default();
        p.push(b"data: {\"type\":");
        assert!(p.next_event().is_none());
        p.push(b"\"game_update\"}\n");
        assert!(p.next_event().is_none());
        p.push(b"\n");
        assert_eq!(drain(&mut p), vec![r#"{"type":"game_update"}"#]);
    }

    #[test]
    fn multi_line_data_joined_with_newline() {
        let mut p = SseParser::default();
        p.push(b"data: first\ndata: second\n\n");
        assert_eq!(drain(&mut p), vec!["first\nsecond"]);
    }

    #[test]
    fn comments_and_unused_fields_ignored() {
        let mut p = SseParser::default();
        p.push(b": keep-alive\nevent: update\nid: 7\nretry: 500\ndata: x\n\n");
        assert_eq!(drain(&mut p), vec!["x"]);
    }

    #[test]
    fn crlf_line_endings() {
        let mut p = SseParser::default();
        p.push(b"data: x\r\n\r\ndata: y\r\n\r\n");
        assert_eq!(drain(&mut p), vec!["x", "y"]);
    }

    #[test]
    fn blank_lines_without_data_emit_nothing() {
        let mut p = SseParser::default();
        p.push(b"\n\n: ping\n\n");
        assert!(p.next_event().is_none());
    }

    #[test]
    fn data_without_space_after_colon() {
        let mut p = SseParser::default();
        p.push(b"data:tight\n\n");
        assert_eq!(drain(&mut p), vec!["tight"]);
    }
}
