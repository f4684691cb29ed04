//! Wire protocol: the JSON envelope shared by both transports.
//!
//! All parsing is panic-free: malformed input is reported as
//! `RelinkError::Malformed` instead of panicking, keeping the channel
//! resilient to garbage frames.

pub mod envelope;

pub use envelope::{Envelope, InboundMessage};
