//! Batch unwrapping.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tdfeed_core::protocol::{parse_batch, MsgType};
use tdfeed_core::ErrorCode;

#[test]
fn unwraps_envelopes_in_order() {
    let payload = br#"[
        {"CA_MSG": {"msg_type": "CA", "area_id": "CA"}},
        {"SF_MSG": {"msg_type": "SF", "area_id": "CA"}},
        {"ZZ_MSG": {"area_id": "CA"}}
    ]"#;
    let msgs = parse_batch(payload).unwrap();
    let kinds: Vec<Option<MsgType>> = msgs.iter().map(|m| m.kind()).collect();
    assert_eq!(kinds, vec![Some(MsgType::BerthStep), Some(MsgType::SignallingUpdate), None]);
}

#[test]
fn empty_array_is_an_empty_batch() {
    assert!(parse_batch(b"[]").unwrap().is_empty());
}

#[test]
fn rejects_bad_shapes() {
    let cases: [&[u8]; 6] = [
        br#"{"CA_MSG": {}}"#,
        br#"[1]"#,
        br#"[{}]"#,
        br#"[{"CA_MSG": "CA"}]"#,
        br#"[{"CA_MSG": {"msg_type": "CA"}}, null]"#,
        b"not json",
    ];
    for c in cases {
        let err = parse_batch(c).expect_err("expected failure");
        assert_eq!(err.code(), ErrorCode::MalformedBatch, "case={}", String::from_utf8_lossy(c));
    }
}
