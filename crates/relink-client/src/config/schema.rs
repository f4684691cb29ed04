use serde::Deserialize;

use relink_core::backoff::Backoff;
use relink_core::error::{RelinkError, Result};
use relink_core::liveness::Liveness;

use crate::transport::TransportKind;

/// Channel construction contract. Immutable after construction.
///
/// The serde defaults reproduce the device-control socket configuration;
/// `ChannelConfig::stream` gives the event-stream configuration. The two
/// differ deliberately (caps, base delays, back-off shape, liveness) and
/// stay independently configurable per instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Resource locator the transport connects to.
    pub endpoint: String,

    #[serde(default = "default_transport")]
    pub transport: TransportKind,

    /// Cap on consecutive reconnect attempts before giving up permanently.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff")]
    pub backoff: Backoff,

    #[serde(default = "default_liveness")]
    pub liveness: Liveness,

    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
}

fn default_transport() -> TransportKind {
    TransportKind::BidirectionalSocket
}
fn default_max_attempts() -> u32 {
    10
}
fn default_base_delay_ms() -> u64 {
    5000
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_backoff() -> Backoff {
    Backoff::Multiplicative { factor: 1.5 }
}
fn default_liveness() -> Liveness {
    Liveness::PingPong
}
fn default_heartbeat_interval_ms() -> u64 {
    30_000
}
fn default_heartbeat_timeout_ms() -> u64 {
    90_000
}

impl ChannelConfig {
    /// Device-control socket preset: 5s base, 30s cap, x1.5 per attempt,
    /// 10 attempts, explicit ping/pong liveness.
    pub fn socket(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: TransportKind::BidirectionalSocket,
            max_attempts: 10,
            base_delay_ms: 5000,
            max_delay_ms: 30_000,
            backoff: Backoff::Multiplicative { factor: 1.5 },
            liveness: Liveness::PingPong,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 90_000,
        }
    }

    /// Turn-based event-stream preset: 1s base, 30s cap, linear growth,
    /// 5 attempts, any inbound frame counts as liveness.
    pub fn stream(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: TransportKind::UnidirectionalStream,
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff: Backoff::LinearClamped,
            liveness: Liveness::AnyTraffic,
            heartbeat_interval_ms: 5000,
            heartbeat_timeout_ms: 30_000,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(RelinkError::InvalidConfig("endpoint must not be empty".into()));
        }
        if self.max_attempts < 1 {
            return Err(RelinkError::InvalidConfig("max_attempts must be at least 1".into()));
        }
        if self.base_delay_ms == 0 {
            return Err(RelinkError::InvalidConfig("base_delay_ms must be positive".into()));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(RelinkError::InvalidConfig(
                "max_delay_ms must be at least base_delay_ms".into(),
            ));
        }
        if let Backoff::Multiplicative { factor } = self.backoff {
            // Monotonicity of the schedule depends on this bound.
            if !(factor >= 1.0) {
                return Err(RelinkError::InvalidConfig(
                    "backoff factor must be at least 1.0".into(),
                ));
            }
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(RelinkError::InvalidConfig(
                "heartbeat_interval_ms must be positive".into(),
            ));
        }
        if self.heartbeat_timeout_ms <= self.heartbeat_interval_ms {
            return Err(RelinkError::InvalidConfig(
                "heartbeat_timeout_ms must be greater than heartbeat_interval_ms".into(),
            ));
        }
        if self.liveness == Liveness::PingPong && !self.transport.can_send() {
            return Err(RelinkError::InvalidConfig(
                "ping-pong liveness requires a bidirectional transport".into(),
            ));
        }
        Ok(())
    }
}
