//! Reconnect back-off policies.
//!
//! Two schedules are preserved as selectable strategies rather than unified:
//! the device-control socket grows its delay multiplicatively, while the
//! event-stream client grows it linearly and clamps at the cap. Both bound
//! every delay by `max_ms`.

use serde::Deserialize;

/// Delay schedule applied between reconnection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Backoff {
    /// `base * factor^(attempt - 1)`, clamped to the cap.
    Multiplicative { factor: f64 },
    /// `base * attempt`, clamped to the cap.
    LinearClamped,
}

impl Backoff {
    /// Compute the delay for `attempt` (1-based), in milliseconds.
    ///
    /// Monotonically non-decreasing in `attempt` as long as the
    /// multiplicative factor is >= 1.0 (enforced by config validation).
    pub fn delay_ms(&self, base_ms: u64, max_ms: u64, attempt: u32) -> u64 {
        let attempt = attempt.max(1);
        let raw = match self {
            Backoff::Multiplicative { factor } => {
                let scaled = base_ms as f64 * factor.powi((attempt - 1) as i32);
                // f64 -> u64 `as` saturates, so overflow lands on the cap.
                scaled.round() as u64
            }
            Backoff::LinearClamped => base_ms.saturating_mul(u64::from(attempt)),
        };
        raw.min(max_ms)
    }
}
