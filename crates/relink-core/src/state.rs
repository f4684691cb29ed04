//! Channel lifecycle state and the status snapshot handed to observers.

use serde::Serialize;

use crate::liveness::Health;

/// Why a channel reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseReason {
    /// Transport failure or heartbeat timeout; a reconnect is scheduled.
    Error,
    /// Explicit `disconnect()`; no automatic reconnection.
    User,
    /// Reconnect attempts hit the cap; no automatic reconnection.
    Exhausted,
}

impl CloseReason {
    /// String form used in logs and status payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Error => "error",
            CloseReason::User => "user",
            CloseReason::Exhausted => "exhausted",
        }
    }

    /// Whether the channel stays down until `connect()` is called again.
    pub fn is_terminal(self) -> bool {
        matches!(self, CloseReason::User | CloseReason::Exhausted)
    }
}

/// Connection lifecycle state.
///
/// `Closed(Error)` is the only non-terminal closed state: a reconnect timer
/// is pending. `Closed(User)` and `Closed(Exhausted)` persist until the
/// caller invokes `connect()` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed(CloseReason),
}

impl ChannelState {
    pub fn is_open(self) -> bool {
        matches!(self, ChannelState::Open)
    }

    /// Whether `connect()` would be a no-op in this state.
    ///
    /// `Closed(Error)` counts as active: a reconnect timer is already
    /// pending and will drive the next open.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ChannelState::Connecting
                | ChannelState::Open
                | ChannelState::Closing
                | ChannelState::Closed(CloseReason::Error)
        )
    }
}

/// Snapshot returned by `RealtimeChannel::status()`.
///
/// `health` runs on its own track: a channel can be `Open` yet `Suspect`
/// when traffic has gone quiet but the timeout has not elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub state: ChannelState,
    pub health: Health,
    /// Consecutive reconnect attempts since the last successful open.
    pub attempt: u32,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self {
            state: ChannelState::Idle,
            health: Health::Alive,
            attempt: 0,
        }
    }
}
