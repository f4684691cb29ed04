//! Channel driver: the connect/serve/reconnect state machine.
//!
//! One driver task per channel. Every suspension point lives in this task's
//! `select!` loops, which is what guarantees at most one connect attempt and
//! one heartbeat check in flight, and strictly serialized callbacks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use relink_core::error::RelinkError;
use relink_core::liveness::Liveness;
use relink_core::protocol::envelope::{self, Envelope, InboundMessage};
use relink_core::{ChannelState, ChannelStatus, CloseReason, Health, HeartbeatState};

use crate::config::ChannelConfig;
use crate::dispatch::ChannelEvents;
use crate::transport::{Transport, TransportConn};

/// Handle-to-driver commands.
pub(crate) enum Command {
    Send(String),
    Disconnect,
}

/// How a serve loop ended.
enum ServeEnd {
    /// `disconnect()`: terminal, no reconnect.
    UserClose,
    /// Transport error or heartbeat timeout: feeds the reconnect schedule.
    Failure,
}

enum OpenOutcome {
    Opened(Box<dyn TransportConn>),
    Failed(RelinkError),
    UserClose,
}

pub(crate) struct Driver {
    cfg: ChannelConfig,
    transport: Arc<dyn Transport>,
    events: Arc<dyn ChannelEvents>,
    status: watch::Sender<ChannelStatus>,
    /// Consecutive reconnect attempts; reset only by a successful open.
    attempt: u32,
}

impl Driver {
    pub(crate) fn new(
        cfg: ChannelConfig,
        transport: Arc<dyn Transport>,
        events: Arc<dyn ChannelEvents>,
        status: watch::Sender<ChannelStatus>,
    ) -> Self {
        Self {
            cfg,
            transport,
            events,
            status,
            attempt: 0,
        }
    }

    pub(crate) async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>) {
        loop {
            self.set_state(ChannelState::Connecting);
            tracing::info!(endpoint = %self.cfg.endpoint, attempt = self.attempt, "opening transport");

            match self.open_transport(&mut cmd_rx).await {
                OpenOutcome::Opened(conn) => {
                    self.attempt = 0;
                    self.status.send_modify(|s| {
                        s.state = ChannelState::Open;
                        s.health = Health::Alive;
                        s.attempt = 0;
                    });
                    tracing::info!("transport open");
                    self.events.on_open();

                    match self.serve(conn, &mut cmd_rx).await {
                        ServeEnd::UserClose => {
                            self.finish(CloseReason::User);
                            return;
                        }
                        ServeEnd::Failure => {
                            self.set_state(ChannelState::Closed(CloseReason::Error));
                            self.events.on_closed(CloseReason::Error);
                        }
                    }
                }
                OpenOutcome::Failed(e) => {
                    tracing::warn!(error = %e, "transport open failed");
                    self.set_state(ChannelState::Closed(CloseReason::Error));
                    self.events.on_error(&e);
                }
                OpenOutcome::UserClose => {
                    self.finish(CloseReason::User);
                    return;
                }
            }

            if !self.schedule_reconnect(&mut cmd_rx).await {
                return;
            }
        }
    }

    /// Open the transport while staying responsive to `disconnect()`.
    /// An indefinitely slow open is bounded only by the user closing.
    async fn open_transport(&mut self, cmd_rx: &mut mpsc::Receiver<Command>) -> OpenOutcome {
        let transport = Arc::clone(&self.transport);
        let endpoint = self.cfg.endpoint.clone();
        let open = async move { transport.open(&endpoint).await };
        tokio::pin!(open);
        loop {
            tokio::select! {
                res = &mut open => {
                    return match res {
                        Ok(conn) => OpenOutcome::Opened(conn),
                        Err(e) => OpenOutcome::Failed(e),
                    };
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(_)) => tracing::warn!("send dropped: channel not open"),
                    Some(Command::Disconnect) | None => return OpenOutcome::UserClose,
                }
            }
        }
    }

    /// Pump one live connection until it fails or the user closes.
    async fn serve(
        &mut self,
        mut conn: Box<dyn TransportConn>,
        cmd_rx: &mut mpsc::Receiver<Command>,
    ) -> ServeEnd {
        let mut hb = HeartbeatState::new(
            self.cfg.heartbeat_interval_ms,
            self.cfg.heartbeat_timeout_ms,
        );
        hb.mark_open(Instant::now().into_std());

        let period = Duration::from_millis(self.cfg.heartbeat_interval_ms);
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = conn.recv() => match frame {
                    Some(Ok(raw)) => {
                        if let Some(end) = self.handle_inbound(&raw, &mut hb, conn.as_mut()).await {
                            return end;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "transport error");
                        self.events.on_error(&e);
                        conn.close().await;
                        return ServeEnd::Failure;
                    }
                    None => {
                        tracing::info!("transport stream ended");
                        return ServeEnd::Failure;
                    }
                },

                _ = tick.tick() => {
                    if let Some(end) = self.heartbeat_tick(&mut hb, conn.as_mut()).await {
                        return end;
                    }
                }

                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(raw)) => {
                        if let Err(e) = conn.send(raw).await {
                            tracing::warn!(error = %e, "write failed");
                            self.events.on_error(&e);
                            conn.close().await;
                            return ServeEnd::Failure;
                        }
                    }
                    Some(Command::Disconnect) | None => {
                        self.set_state(ChannelState::Closing);
                        conn.close().await;
                        return ServeEnd::UserClose;
                    }
                },
            }
        }
    }

    /// Decode and dispatch one inbound frame. Malformed frames are reported
    /// and dropped, never fatal; reserved kinds feed liveness and are
    /// filtered from routing.
    async fn handle_inbound(
        &mut self,
        raw: &str,
        hb: &mut HeartbeatState,
        conn: &mut dyn TransportConn,
    ) -> Option<ServeEnd> {
        let now = Instant::now().into_std();
        let env = match Envelope::decode(raw) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                self.events.on_error(&e);
                return None;
            }
        };

        hb.observe(self.cfg.liveness, &env.kind, now);
        self.set_health(hb.classify(now));

        match env.kind.as_str() {
            envelope::KIND_HEARTBEAT => {
                // The socket dialect answers server probes.
                if self.cfg.liveness == Liveness::PingPong {
                    return self.send_probe(envelope::KIND_PONG, conn).await;
                }
                None
            }
            envelope::KIND_PING | envelope::KIND_PONG => None,
            _ => {
                self.events
                    .on_message(InboundMessage::from_envelope(env, now));
                None
            }
        }
    }

    /// Periodic liveness check; in ping/pong mode, also sends the probe.
    async fn heartbeat_tick(
        &mut self,
        hb: &mut HeartbeatState,
        conn: &mut dyn TransportConn,
    ) -> Option<ServeEnd> {
        let now = Instant::now().into_std();
        let health = hb.classify(now);
        self.set_health(health);

        if health == Health::Dead {
            let e = RelinkError::HeartbeatTimeout(self.cfg.heartbeat_timeout_ms);
            tracing::warn!(error = %e, "closing transport");
            self.events.on_error(&e);
            conn.close().await;
            return Some(ServeEnd::Failure);
        }

        if self.cfg.liveness == Liveness::PingPong {
            return self.send_probe(envelope::KIND_PING, conn).await;
        }
        None
    }

    async fn send_probe(&mut self, kind: &str, conn: &mut dyn TransportConn) -> Option<ServeEnd> {
        let raw = match Envelope::encode(kind, &serde_json::Value::Null) {
            Ok(raw) => raw,
            Err(e) => {
                self.events.on_error(&e);
                return None;
            }
        };
        if let Err(e) = conn.send(raw).await {
            tracing::warn!(error = %e, "probe write failed");
            self.events.on_error(&e);
            conn.close().await;
            return Some(ServeEnd::Failure);
        }
        None
    }

    /// Count the failure and wait out the back-off delay, staying responsive
    /// to `disconnect()`. Returns `false` when the driver must exit.
    async fn schedule_reconnect(&mut self, cmd_rx: &mut mpsc::Receiver<Command>) -> bool {
        self.attempt += 1;
        if self.attempt > self.cfg.max_attempts {
            tracing::error!(max_attempts = self.cfg.max_attempts, "max reconnection attempts reached");
            self.set_state(ChannelState::Closed(CloseReason::Exhausted));
            self.events.on_closed(CloseReason::Exhausted);
            return false;
        }

        let delay = self
            .cfg
            .backoff
            .delay_ms(self.cfg.base_delay_ms, self.cfg.max_delay_ms, self.attempt);
        self.status.send_modify(|s| s.attempt = self.attempt);
        tracing::info!(attempt = self.attempt, delay_ms = delay, "scheduling reconnect");

        let deadline = Instant::now() + Duration::from_millis(delay);
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return true,
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(_)) => tracing::warn!("send dropped: channel not open"),
                    Some(Command::Disconnect) | None => {
                        self.finish(CloseReason::User);
                        return false;
                    }
                }
            }
        }
    }

    fn finish(&self, reason: CloseReason) {
        self.set_state(ChannelState::Closed(reason));
        tracing::info!(reason = reason.as_str(), "channel closed");
        self.events.on_closed(reason);
    }

    fn set_state(&self, state: ChannelState) {
        self.status.send_modify(|s| s.state = state);
    }

    fn set_health(&self, health: Health) {
        self.status.send_modify(|s| s.health = health);
    }
}
