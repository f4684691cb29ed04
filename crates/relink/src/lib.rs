//! Top-level facade crate for relink.
//!
//! Re-exports the core types and the client so users can depend on a single crate.

pub mod core {
    pub use relink_core::*;
}

pub mod client {
    pub use relink_client::*;
}

pub use relink_client::{ChannelConfig, ChannelEvents, RealtimeChannel, Router};
pub use relink_core::{ChannelState, ChannelStatus, CloseReason, Health, RelinkError};
