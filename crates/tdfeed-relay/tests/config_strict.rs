#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tdfeed_core::protocol::AddressRadix;
use tdfeed_relay::config::{self, OutputKind, SourceKind};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
feed:
  username: "user"
  passcode: "secret"
  reconect: { max_attempts: 3 } # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "INVALID_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
feed:
  username: "user"
  passcode: "secret"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.source.kind, SourceKind::Stomp);
    assert_eq!(cfg.feed.topic, "/topic/TD_ALL_SIG_AREA");
    assert_eq!(cfg.feed.port, 61618);
    assert!(!cfg.feed.durable);
    assert_eq!(cfg.decoder.area_id, "CA");
    assert_eq!(cfg.decoder.max_address, 200);
    assert_eq!(cfg.decoder.address_radix, AddressRadix::Decimal);
    assert_eq!(cfg.output.kind, OutputKind::Stdout);
    assert!(cfg.ops.is_none());

    let settings = config::stomp_settings(&cfg.feed).expect("settings");
    assert_eq!(settings.client_id, "user");
    assert_eq!(settings.subscription_name(), "user/topic/TD_ALL_SIG_AREA");
}

#[test]
fn replay_needs_no_credentials() {
    let ok = r#"
version: 1
source: { kind: replay, path: "-" }
decoder: { area_id: "WY", max_address: 255, address_radix: hex }
output: { kind: forward, listen: "127.0.0.1:0", include_timestamp: true }
ops: { listen: "127.0.0.1:9090" }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.source.kind, SourceKind::Replay);
    let dec = cfg.decoder_config();
    assert_eq!(dec.area_id, "WY");
    assert_eq!(dec.max_address, 255);
    assert_eq!(dec.address_radix, AddressRadix::Hex);
    assert!(cfg.line_format().include_timestamp);
}

#[test]
fn rejects_invalid_values() {
    let cases = [
        "version: 2\nsource: { kind: replay, path: x }",
        "version: 1",
        "version: 1\nsource: { kind: replay }",
        "version: 1\nsource: { kind: replay, path: x }\nfeed: { heartbeat_ms: 10 }",
        "version: 1\nsource: { kind: replay, path: x }\nfeed: { topic: TD_ALL }",
        "version: 1\nsource: { kind: replay, path: x }\nfeed: { reconnect: { initial_backoff_ms: 500, max_backoff_ms: 100 } }",
        "version: 1\nsource: { kind: replay, path: x }\noutput: { kind: forward, listen: nowhere }",
        "version: 1\nsource: { kind: replay, path: x }\ndecoder: { area_id: \"\" }",
        "version: 1\nsource: { kind: replay, path: x }\ndecoder: { address_radix: octal }",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.code().as_str(), "INVALID_CONFIG", "case={c}");
    }
}

#[test]
fn credentials_file_format() {
    let (u, p) = config::parse_credentials(r#"["user", "secret", "host-1"]"#).unwrap();
    assert_eq!((u.as_str(), p.as_str()), ("user", "secret"));

    assert!(config::parse_credentials(r#"["user"]"#).is_err());
    assert!(config::parse_credentials(r#"{"user": "secret"}"#).is_err());
}
