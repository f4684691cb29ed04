//! The consumer-facing channel handle.
//!
//! `RealtimeChannel` owns a single driver task (spawned by `connect`) that
//! runs the connect/serve/reconnect state machine. The handle itself only
//! validates, spawns, signals, and snapshots status.

mod driver;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use relink_core::error::{RelinkError, Result};
use relink_core::protocol::Envelope;
use relink_core::{ChannelState, ChannelStatus};

use crate::config::ChannelConfig;
use crate::dispatch::ChannelEvents;
use crate::transport::Transport;

use driver::{Command, Driver};

/// Commands queued toward the driver; writes made while the queue is full
/// are dropped, never buffered.
const CMD_QUEUE: usize = 64;

/// One logical connection to a push endpoint, with automatic reconnection.
pub struct RealtimeChannel {
    cfg: ChannelConfig,
    transport: Arc<dyn Transport>,
    events: Arc<dyn ChannelEvents>,
    status_tx: watch::Sender<ChannelStatus>,
    slot: Mutex<DriverSlot>,
}

#[derive(Default)]
struct DriverSlot {
    cmd_tx: Option<mpsc::Sender<Command>>,
    task: Option<JoinHandle<()>>,
}

impl RealtimeChannel {
    /// Build a channel from a validated config, an injected transport, and
    /// the caller's event sink. Does not connect.
    pub fn new(
        cfg: ChannelConfig,
        transport: Arc<dyn Transport>,
        events: Arc<dyn ChannelEvents>,
    ) -> Result<Self> {
        cfg.validate()?;
        if transport.kind() != cfg.transport {
            return Err(RelinkError::InvalidConfig(
                "transport kind does not match config".into(),
            ));
        }
        let (status_tx, _) = watch::channel(ChannelStatus::default());
        Ok(Self {
            cfg,
            transport,
            events,
            status_tx,
            slot: Mutex::new(DriverSlot::default()),
        })
    }

    /// Build a channel with the default transport for the configured kind.
    pub fn with_default_transport(cfg: ChannelConfig, events: Arc<dyn ChannelEvents>) -> Result<Self> {
        let transport = crate::transport::for_kind(cfg.transport);
        Self::new(cfg, transport, events)
    }

    /// Start connecting. Idempotent: a no-op while the channel is already
    /// connecting, open, or waiting on a reconnect timer. Network failure is
    /// never reported synchronously; the outcome arrives through the event
    /// sink. Must be called within a tokio runtime.
    pub fn connect(&self) {
        let mut slot = self.lock_slot();
        if let Some(task) = &slot.task {
            if !task.is_finished() {
                tracing::debug!("connect: channel already active");
                return;
            }
        }
        self.status_tx.send_modify(|s| {
            s.state = ChannelState::Connecting;
            s.attempt = 0;
        });
        let (cmd_tx, cmd_rx) = mpsc::channel(CMD_QUEUE);
        let d = Driver::new(
            self.cfg.clone(),
            Arc::clone(&self.transport),
            Arc::clone(&self.events),
            self.status_tx.clone(),
        );
        slot.cmd_tx = Some(cmd_tx);
        slot.task = Some(tokio::spawn(d.run(cmd_rx)));
    }

    /// User-initiated terminal close. Cancels any pending reconnect or
    /// heartbeat timer and waits for the driver to stop, so no callback
    /// fires after this returns. The channel stays down until `connect` is
    /// called again.
    pub async fn disconnect(&self) {
        let (cmd_tx, task) = {
            let mut slot = self.lock_slot();
            (slot.cmd_tx.take(), slot.task.take())
        };
        let Some(task) = task else {
            tracing::debug!("disconnect: channel not running");
            return;
        };
        if let Some(tx) = cmd_tx {
            // Fails only when the driver already exited; join handles both.
            let _ = tx.send(Command::Disconnect).await;
        }
        let _ = task.await;
    }

    /// Write one message through the transport. Fails with `NotConnected`
    /// unless the channel is `Open`; unsent messages are never queued.
    pub fn send(&self, kind: &str, payload: serde_json::Value) -> Result<()> {
        if !self.cfg.transport.can_send() {
            return Err(RelinkError::SendUnsupported);
        }
        if self.status_tx.borrow().state != ChannelState::Open {
            tracing::warn!(kind, "send dropped: channel not open");
            return Err(RelinkError::NotConnected);
        }
        let raw = Envelope::encode(kind, &payload)?;
        let slot = self.lock_slot();
        let Some(tx) = &slot.cmd_tx else {
            return Err(RelinkError::NotConnected);
        };
        tx.try_send(Command::Send(raw)).map_err(|_| {
            tracing::warn!(kind, "send dropped: outbound queue unavailable");
            RelinkError::NotConnected
        })
    }

    /// Current `{state, health, attempt}` snapshot.
    pub fn status(&self) -> ChannelStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to status changes, e.g. for a connection indicator.
    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.status_tx.subscribe()
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, DriverSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
