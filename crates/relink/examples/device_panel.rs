//! Device-control panel wiring: a bidirectional socket channel that mirrors
//! device and group updates, with a status watcher standing in for the UI's
//! connection indicator.
//!
//! Run against a speaker-control endpoint:
//! `cargo run --example device_panel -- ws://localhost:3000/ws/sonos`

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use relink::client::Router;
use relink::{ChannelConfig, ChannelState, CloseReason, RealtimeChannel};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://localhost:3000/ws/sonos".to_string());

    let router = Arc::new(Router::new());
    router.register_fn("device_update", |msg| {
        tracing::info!(payload = ?msg.payload_json(), "device update");
    });
    router.register_fn("group_update", |msg| {
        tracing::info!(payload = ?msg.payload_json(), "group update");
    });
    router.register_fn("device_list", |msg| {
        tracing::info!(payload = ?msg.payload_json(), "device list");
    });

    let channel = RealtimeChannel::with_default_transport(ChannelConfig::socket(endpoint), router)
        .expect("config must validate");

    let mut status = channel.watch_status();
    channel.connect();

    // Ask for the initial device list once the channel opens, and surface
    // terminal states the way the dashboard would.
    loop {
        if status.changed().await.is_err() {
            break;
        }
        let s = *status.borrow();
        tracing::info!(state = ?s.state, health = ?s.health, attempt = s.attempt, "status");
        match s.state {
            ChannelState::Open => {
                if let Err(e) = channel.send("get_devices", serde_json::json!({})) {
                    tracing::warn!(error = %e, "device list request dropped");
                }
            }
            ChannelState::Closed(CloseReason::Exhausted) => {
                tracing::error!("connection lost for good; restart the panel to retry");
                break;
            }
            _ => {}
        }
    }
}
