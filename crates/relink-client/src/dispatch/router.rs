use std::sync::Arc;

use dashmap::DashMap;

use relink_core::protocol::InboundMessage;
use relink_core::{CloseReason, RelinkError};

/// Handler for one message kind.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, msg: &InboundMessage);
}

impl<F> MessageHandler for F
where
    F: Fn(&InboundMessage) + Send + Sync,
{
    fn handle(&self, msg: &InboundMessage) {
        self(msg)
    }
}

/// Everything a channel reports to its owner.
///
/// All callbacks are invoked from the channel's single driver task, so they
/// are strictly serialized with each other: `on_message` never overlaps
/// itself or any lifecycle callback for the same channel.
pub trait ChannelEvents: Send + Sync {
    /// One decoded inbound domain message, in arrival order.
    fn on_message(&self, msg: InboundMessage);
    /// The transport opened and the channel is `Open`.
    fn on_open(&self) {}
    /// The channel closed; `reason` says whether it will reconnect.
    fn on_closed(&self, _reason: CloseReason) {}
    /// A recoverable error: open/transport failure, heartbeat timeout, or a
    /// malformed frame. Never fatal to the caller.
    fn on_error(&self, _err: &RelinkError) {}
}

/// Registry and dispatcher mapping kind tags to handlers.
#[derive(Default)]
pub struct Router {
    handlers: DashMap<String, Arc<dyn MessageHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn register(&self, kind: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(kind.into(), handler);
    }

    /// Register a closure for a kind.
    pub fn register_fn<F>(&self, kind: impl Into<String>, f: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(f));
    }

    pub fn registered_kinds(&self) -> Vec<String> {
        self.handlers.iter().map(|e| e.key().clone()).collect()
    }
}

impl ChannelEvents for Router {
    fn on_message(&self, msg: InboundMessage) {
        // Clone out of the map so a handler can register/unregister freely.
        let handler = self.handlers.get(&msg.kind).map(|e| e.value().clone());
        match handler {
            Some(h) => h.handle(&msg),
            None => tracing::warn!(kind = %msg.kind, "unknown message kind"),
        }
    }
}
