//! relink client: a reconnecting realtime channel.
//!
//! This crate wires the transport, router, and channel driver into the
//! consumer-facing `RealtimeChannel`. One channel owns one logical
//! connection to a push endpoint, delivers decoded messages to a
//! caller-supplied router, detects silent failures via heartbeat timing,
//! and recovers with bounded back-off.

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod transport;

pub use channel::RealtimeChannel;
pub use config::ChannelConfig;
pub use dispatch::{ChannelEvents, MessageHandler, Router};
pub use transport::{Transport, TransportConn, TransportKind};
