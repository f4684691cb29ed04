//! Transport layer: the push-capable primitives a channel opens.
//!
//! The channel never constructs a transport itself; it receives one at
//! construction (dependency injection, no process-wide registry). The two
//! shipped implementations cover the observed endpoints: a full-duplex
//! WebSocket and a one-way SSE stream.

pub mod sse;
pub mod ws;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use relink_core::Result;

/// Which low-level open/send/close semantics apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    BidirectionalSocket,
    UnidirectionalStream,
}

impl TransportKind {
    pub fn can_send(self) -> bool {
        matches!(self, TransportKind::BidirectionalSocket)
    }
}

/// Connection factory. One channel holds one of these and opens at most one
/// connection at a time through it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    fn kind(&self) -> TransportKind;

    /// Open a connection. Open failure is recoverable; the channel schedules
    /// a reconnect. There is no open timeout (an indefinitely slow open is
    /// only bounded by `disconnect()`).
    async fn open(&self, endpoint: &str) -> Result<Box<dyn TransportConn>>;
}

/// One live connection, owned exclusively by the channel driver. Opening a
/// new connection implies the previous one was closed first.
#[async_trait]
pub trait TransportConn: Send {
    /// Next raw text frame. `None` means the stream ended.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Write a raw text frame. Receive-only transports fail with
    /// `SendUnsupported`.
    async fn send(&mut self, raw: String) -> Result<()>;

    /// Close the connection. Best effort; errors are swallowed.
    async fn close(&mut self);
}

/// Default transport for a kind.
pub fn for_kind(kind: TransportKind) -> Arc<dyn Transport> {
    match kind {
        TransportKind::BidirectionalSocket => Arc::new(ws::WsTransport::new()),
        TransportKind::UnidirectionalStream => Arc::new(sse::SseTransport::new()),
    }
}
