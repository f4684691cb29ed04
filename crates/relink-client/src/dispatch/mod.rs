//! Dispatch module exports.
//!
//! Re-exports the router and its traits so downstream consumers can depend
//! on this module directly.

pub mod router;

pub use router::{ChannelEvents, MessageHandler, Router};
