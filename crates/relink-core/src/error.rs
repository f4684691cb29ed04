//! Shared error type across relink crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelinkError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum RelinkError {
    /// The transport could not be opened at all.
    #[error("transport open failed: {0}")]
    TransportOpen(String),
    /// The transport failed mid-connection (read or write).
    #[error("transport error: {0}")]
    Transport(String),
    /// No traffic counted as liveness within the configured timeout.
    #[error("heartbeat timeout after {0}ms of silence")]
    HeartbeatTimeout(u64),
    /// An inbound frame could not be decoded as an envelope.
    #[error("malformed message: {0}")]
    Malformed(String),
    /// `send` was called while the channel is not open.
    #[error("not connected")]
    NotConnected,
    /// `send` was called on a receive-only transport.
    #[error("transport is receive-only")]
    SendUnsupported,
    /// Consecutive reconnect attempts reached the configured cap.
    #[error("reconnect attempts exhausted")]
    Exhausted,
    /// Rejected channel configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl RelinkError {
    /// Whether the channel recovers from this error on its own.
    ///
    /// Recoverable connection-level errors feed the reconnect schedule;
    /// local errors (`Malformed`, `NotConnected`, `SendUnsupported`) affect
    /// neither connection nor state. `Exhausted` and `InvalidConfig` require
    /// explicit caller action.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RelinkError::TransportOpen(_)
            | RelinkError::Transport(_)
            | RelinkError::HeartbeatTimeout(_)
            | RelinkError::Malformed(_)
            | RelinkError::NotConnected
            | RelinkError::SendUnsupported => true,
            RelinkError::Exhausted | RelinkError::InvalidConfig(_) => false,
        }
    }
}
