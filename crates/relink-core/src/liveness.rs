//! Heartbeat-driven liveness tracking.
//!
//! The two endpoint families define liveness differently and the divergence
//! is kept configurable: the bidirectional socket only trusts an explicit
//! `pong` (or a server-initiated `heartbeat`, which it answers), while the
//! one-way event stream counts any inbound frame. Health is classified from
//! the time since the last counted frame, independent of lifecycle state.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::protocol::envelope::{KIND_HEARTBEAT, KIND_PONG};

/// What counts as proof the connection is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Liveness {
    /// Only an explicit `pong` or server `heartbeat` frame counts.
    PingPong,
    /// Any inbound frame counts.
    AnyTraffic,
}

impl Liveness {
    /// Whether an inbound frame of `kind` counts toward liveness.
    pub fn counts(self, kind: &str) -> bool {
        match self {
            Liveness::AnyTraffic => true,
            Liveness::PingPong => kind == KIND_PONG || kind == KIND_HEARTBEAT,
        }
    }
}

/// Liveness classification, orthogonal to `ChannelState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    /// Counted traffic within the heartbeat interval.
    Alive,
    /// Quiet for longer than one interval but under the timeout.
    Suspect,
    /// Quiet past the timeout; the transport is presumed dead.
    Dead,
}

/// Tracks when the connection last proved it was alive.
#[derive(Debug, Clone)]
pub struct HeartbeatState {
    last_seen: Option<Instant>,
    interval: Duration,
    timeout: Duration,
}

impl HeartbeatState {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            last_seen: None,
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Reset the clock, e.g. right after a successful open.
    pub fn mark_open(&mut self, now: Instant) {
        self.last_seen = Some(now);
    }

    /// Record an inbound frame if the policy counts it.
    pub fn observe(&mut self, policy: Liveness, kind: &str, now: Instant) {
        if policy.counts(kind) {
            self.last_seen = Some(now);
        }
    }

    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    /// Classify health from the time since the last counted frame.
    ///
    /// Before the clock is started (`mark_open`) the connection is given the
    /// benefit of the doubt and reads as `Alive`.
    pub fn classify(&self, now: Instant) -> Health {
        let Some(last) = self.last_seen else {
            return Health::Alive;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed <= self.interval {
            Health::Alive
        } else if elapsed <= self.timeout {
            Health::Suspect
        } else {
            Health::Dead
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_only_counts_pong_and_heartbeat() {
        assert!(Liveness::PingPong.counts("pong"));
        assert!(Liveness::PingPong.counts("heartbeat"));
        assert!(!Liveness::PingPong.counts("device_update"));
        assert!(!Liveness::PingPong.counts("ping"));
    }

    #[test]
    fn any_traffic_counts_everything() {
        assert!(Liveness::AnyTraffic.counts("heartbeat"));
        assert!(Liveness::AnyTraffic.counts("game_update"));
    }

    #[test]
    fn classification_thresholds() {
        let mut hb = HeartbeatState::new(5000, 30_000);
        let start = Instant::now();
        // No traffic yet: benefit of the doubt.
        assert_eq!(hb.classify(start), Health::Alive);

        hb.mark_open(start);
        assert_eq!(hb.classify(start + Duration::from_millis(4000)), Health::Alive);
        assert_eq!(hb.classify(start + Duration::from_millis(5001)), Health::Suspect);
        assert_eq!(hb.classify(start + Duration::from_millis(30_001)), Health::Dead);
    }

    #[test]
    fn observe_respects_policy() {
        let mut hb = HeartbeatState::new(5000, 30_000);
        let start = Instant::now();
        hb.mark_open(start);

        let later = start + Duration::from_millis(10_000);
        hb.observe(Liveness::PingPong, "game_update", later);
        assert_eq!(hb.last_seen(), Some(start), "domain frame must not count");

        hb.observe(Liveness::AnyTraffic, "game_update", later);
        assert_eq!(hb.last_seen(), Some(later));
    }
}
