#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use relink_client::config;
use relink_client::transport::TransportKind;
use relink_core::backoff::Backoff;
use relink_core::liveness::Liveness;

#[test]
fn deny_unknown_fields() {
    let bad = r#"
endpoint: "ws://localhost:3000/ws/sonos"
max_attemptz: 3 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("invalid yaml"));
}

#[test]
fn ok_minimal_config_uses_socket_defaults() {
    let ok = r#"
endpoint: "ws://localhost:3000/ws/sonos"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.transport, TransportKind::BidirectionalSocket);
    assert_eq!(cfg.max_attempts, 10);
    assert_eq!(cfg.base_delay_ms, 5000);
    assert_eq!(cfg.max_delay_ms, 30_000);
    assert!(matches!(cfg.backoff, Backoff::Multiplicative { .. }));
    assert_eq!(cfg.liveness, Liveness::PingPong);
    assert_eq!(cfg.heartbeat_interval_ms, 30_000);
    assert_eq!(cfg.heartbeat_timeout_ms, 90_000);
}

#[test]
fn full_stream_config() {
    let ok = r#"
endpoint: "https://game.example/api/updates"
transport: unidirectional-stream
max_attempts: 5
base_delay_ms: 1000
max_delay_ms: 30000
backoff:
  strategy: linear-clamped
liveness: any-traffic
heartbeat_interval_ms: 5000
heartbeat_timeout_ms: 30000
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.transport, TransportKind::UnidirectionalStream);
    assert!(matches!(cfg.backoff, Backoff::LinearClamped));
    assert_eq!(cfg.liveness, Liveness::AnyTraffic);
}

#[test]
fn empty_endpoint_rejected() {
    let err = config::load_from_str(r#"endpoint: """#).expect_err("must fail");
    assert!(err.to_string().contains("endpoint"));
}

#[test]
fn zero_attempts_rejected() {
    let bad = r#"
endpoint: "ws://localhost:3000/ws/sonos"
max_attempts: 0
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("max_attempts"));
}

#[test]
fn ping_pong_requires_bidirectional_transport() {
    let bad = r#"
endpoint: "https://game.example/api/updates"
transport: unidirectional-stream
liveness: ping-pong
heartbeat_interval_ms: 5000
heartbeat_timeout_ms: 30000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("bidirectional"));
}

#[test]
fn heartbeat_timeout_must_exceed_interval() {
    let bad = r#"
endpoint: "ws://localhost:3000/ws/sonos"
heartbeat_interval_ms: 30000
heartbeat_timeout_ms: 30000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("heartbeat_timeout_ms"));
}

#[test]
fn backoff_factor_below_one_rejected() {
    let bad = r#"
endpoint: "ws://localhost:3000/ws/sonos"
backoff:
  strategy: multiplicative
  factor: 0.5
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("factor"));
}

#[test]
fn max_delay_below_base_rejected() {
    let bad = r#"
endpoint: "ws://localhost:3000/ws/sonos"
base_delay_ms: 5000
max_delay_ms: 1000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("max_delay_ms"));
}
