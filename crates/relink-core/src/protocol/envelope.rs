//! Message envelope (JSON text frames).
//!
//! Both push endpoints speak the same shape: a UTF-8 text frame with a
//! `type` kind tag and an optional structured payload. The payload is kept
//! as `RawValue` to enable lazy parsing by whichever handler the router
//! picks. The stream endpoint nests its payload under `payload`; the socket
//! endpoint uses `data` — both spellings are accepted.

use std::time::Instant;

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{RelinkError, Result};

/// Reserved kind: server-initiated liveness probe.
pub const KIND_HEARTBEAT: &str = "heartbeat";
/// Reserved kind: client-initiated liveness probe.
pub const KIND_PING: &str = "ping";
/// Reserved kind: liveness reply.
pub const KIND_PONG: &str = "pong";

/// Whether a kind is consumed by the channel and never routed.
pub fn is_reserved(kind: &str) -> bool {
    matches!(kind, KIND_HEARTBEAT | KIND_PING | KIND_PONG)
}

/// Decoded inbound frame.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Kind tag (field name is `type` on the wire).
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default, alias = "data")]
    pub payload: Option<Box<RawValue>>,
}

impl Envelope {
    /// Decode a raw text frame.
    pub fn decode(raw: &str) -> Result<Envelope> {
        serde_json::from_str(raw)
            .map_err(|e| RelinkError::Malformed(format!("invalid envelope json: {e}")))
    }

    /// Encode an outbound frame. `payload == Null` produces a bare
    /// `{"type": kind}` frame, the shape ping/pong probes use.
    pub fn encode(kind: &str, payload: &serde_json::Value) -> Result<String> {
        let mut obj = serde_json::Map::new();
        obj.insert("type".into(), serde_json::Value::String(kind.to_string()));
        if !payload.is_null() {
            obj.insert("payload".into(), payload.clone());
        }
        serde_json::to_string(&serde_json::Value::Object(obj))
            .map_err(|e| RelinkError::Malformed(format!("json encode failed: {e}")))
    }
}

/// A decoded message on its way to the router. Owned transiently by the
/// channel; nothing is retained after dispatch.
#[derive(Debug)]
pub struct InboundMessage {
    pub kind: String,
    pub payload: Option<Box<RawValue>>,
    pub received_at: Instant,
}

impl InboundMessage {
    pub fn from_envelope(env: Envelope, received_at: Instant) -> Self {
        Self {
            kind: env.kind,
            payload: env.payload,
            received_at,
        }
    }

    /// Payload as a string slice of raw JSON, if present.
    pub fn payload_json(&self) -> Option<&str> {
        self.payload.as_deref().map(RawValue::get)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn decodes_payload_field() {
        let env = Envelope::decode(r#"{"type":"game_update","payload":{"score":12}}"#)
            .expect("must parse");
        assert_eq!(env.kind, "game_update");
        assert_eq!(env.payload.as_deref().map(RawValue::get), Some(r#"{"score":12}"#));
    }

    #[test]
    fn accepts_data_alias() {
        let env = Envelope::decode(r#"{"type":"device_update","data":{"volume":30}}"#)
            .expect("must parse");
        assert_eq!(env.kind, "device_update");
        assert!(env.payload.is_some());
    }

    #[test]
    fn bare_heartbeat_frame() {
        let env = Envelope::decode(r#"{"type":"heartbeat"}"#).expect("must parse");
        assert_eq!(env.kind, "heartbeat");
        assert!(env.payload.is_none());
        assert!(is_reserved(&env.kind));
    }

    #[test]
    fn rejects_missing_kind() {
        let err = Envelope::decode(r#"{"payload":{}}"#).expect_err("must fail");
        assert!(matches!(err, RelinkError::Malformed(_)));
    }

    #[test]
    fn rejects_non_json() {
        let err = Envelope::decode("not json at all").expect_err("must fail");
        assert!(matches!(err, RelinkError::Malformed(_)));
    }

    #[test]
    fn encode_omits_null_payload() {
        let s = Envelope::encode("ping", &serde_json::Value::Null).expect("must encode");
        assert_eq!(s, r#"{"type":"ping"}"#);
    }

    #[test]
    fn encode_includes_payload() {
        let s = Envelope::encode("get_device", &serde_json::json!({"uuid":"abc"}))
            .expect("must encode");
        let env = Envelope::decode(&s).expect("round trip");
        assert_eq!(env.kind, "get_device");
        assert_eq!(env.payload.as_deref().map(RawValue::get), Some(r#"{"uuid":"abc"}"#));
    }

    #[test]
    fn domain_kinds_are_not_reserved() {
        assert!(!is_reserved("device_update"));
        assert!(!is_reserved("game_update"));
    }
}
