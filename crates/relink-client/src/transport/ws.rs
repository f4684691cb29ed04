//! WebSocket transport (tokio-tungstenite).
//!
//! Envelope frames travel as text. Protocol-level ping/pong is answered by
//! tungstenite below this layer and never surfaces to the channel; the
//! application-level ping/pong envelopes are the channel's concern.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use relink_core::error::{RelinkError, Result};

use super::{Transport, TransportConn, TransportKind};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection factory for `ws://` / `wss://` endpoints.
#[derive(Debug, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::BidirectionalSocket
    }

    async fn open(&self, endpoint: &str) -> Result<Box<dyn TransportConn>> {
        let (ws, _resp) = connect_async(endpoint)
            .await
            .map_err(|e| RelinkError::TransportOpen(e.to_string()))?;
        tracing::debug!(endpoint, "websocket opened");
        Ok(Box::new(WsConn { ws }))
    }
}

struct WsConn {
    ws: WsStream,
}

#[async_trait]
impl TransportConn for WsConn {
    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(t)) => return Some(Ok(t.to_string())),
                Ok(Message::Binary(b)) => {
                    // Envelope frames are UTF-8 JSON regardless of frame type.
                    return Some(match String::from_utf8(b.to_vec()) {
                        Ok(s) => Ok(s),
                        Err(e) => Err(RelinkError::Malformed(format!("non-utf8 frame: {e}"))),
                    });
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Ok(Message::Close(_)) => return None,
                Err(e) => return Some(Err(RelinkError::Transport(e.to_string()))),
            }
        }
    }

    async fn send(&mut self, raw: String) -> Result<()> {
        self.ws
            .send(Message::Text(raw.into()))
            .await
            .map_err(|e| RelinkError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
