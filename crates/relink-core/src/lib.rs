//! relink core: transport-agnostic channel primitives, error types, and policies.
//!
//! This crate defines the state model, back-off and liveness policies, and the
//! wire envelope shared by the client and by consumer code. It intentionally
//! carries no transport or runtime dependencies so it can be reused in
//! multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RelinkError`/`Result` so a channel
//! never takes down its host process on malformed input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod backoff;
pub mod error;
pub mod liveness;
pub mod protocol;
pub mod state;

/// Shared result type.
pub use error::{RelinkError, Result};
pub use liveness::{Health, HeartbeatState, Liveness};
pub use state::{ChannelState, ChannelStatus, CloseReason};
