//! Decoder properties not covered by the vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use tdfeed_core::protocol::{AddressRadix, Decoder, DecoderConfig, Event, RawMessage};
use tdfeed_core::ErrorCode;

fn msg(v: serde_json::Value) -> RawMessage {
    serde_json::from_value(v).unwrap()
}

fn signal(address: u32, value: &str, time: Option<&str>) -> Event {
    Event::SignalByte {
        address,
        value: value.into(),
        time: time.map(str::to_owned),
    }
}

#[test]
fn other_areas_are_silent_for_every_type() {
    let d = Decoder::default();
    for ty in ["CA", "CB", "CC", "CT", "SF", "SG", "SH", "ZZ"] {
        let m = msg(json!({"msg_type": ty, "area_id": "WY", "address": "0", "data": "0A0B0C0D"}));
        assert!(d.decode(&m).unwrap().is_empty(), "type={ty}");
    }
    let no_area = msg(json!({"msg_type": "SF", "address": "0", "data": "0A"}));
    assert!(d.decode(&no_area).unwrap().is_empty());
}

#[test]
fn refresh_start_precedes_bytes() {
    let d = Decoder::default();
    let m = msg(json!({"msg_type": "SG", "area_id": "CA", "time": "100", "address": "0", "data": "0A0B0C0D"}));
    let events = d.decode(&m).unwrap();
    assert_eq!(
        events,
        vec![
            Event::RefreshStarted,
            signal(0, "0A", Some("100")),
            signal(1, "0B", Some("100")),
            signal(2, "0C", Some("100")),
            signal(3, "0D", Some("100")),
        ]
    );
}

#[test]
fn clipped_run_has_no_start_marker() {
    let d = Decoder::default();
    let m = msg(json!({"msg_type": "SG", "area_id": "CA", "address": 199, "data": "0A0B0C0D"}));
    let events = d.decode(&m).unwrap();
    assert_eq!(events, vec![signal(199, "0A", None), signal(200, "0B", None)]);
}

#[test]
fn finished_at_zero_carries_both_markers() {
    let d = Decoder::default();
    let m = msg(json!({"msg_type": "SH", "area_id": "CA", "address": "0", "data": "01"}));
    let events = d.decode(&m).unwrap();
    assert_eq!(
        events,
        vec![Event::RefreshStarted, signal(0, "01", None), Event::RefreshFinished]
    );
}

#[test]
fn refresh_never_exceeds_four_bytes() {
    let d = Decoder::default();
    let m = msg(json!({"msg_type": "SG", "area_id": "CA", "address": "20", "data": "0102030405060708"}));
    let events = d.decode(&m).unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events.last(), Some(&signal(23, "04", None)));
}

#[test]
fn bytes_beyond_the_limit_are_not_validated() {
    let d = Decoder::default();
    let m = msg(json!({"msg_type": "SG", "area_id": "CA", "address": "200", "data": "0AZZZZZZ"}));
    assert_eq!(d.decode(&m).unwrap(), vec![signal(200, "0A", None)]);
}

#[test]
fn decode_is_repeatable() {
    let d = Decoder::default();
    let m = msg(json!({"msg_type": "SH", "area_id": "CA", "address": "198", "data": "A1B2C3D4"}));
    let first = d.decode(&m).unwrap();
    let second = d.decode(&m).unwrap();
    assert_eq!(first, second);
}

#[test]
fn hex_radix_reads_feed_style_addresses() {
    let d = Decoder::new(DecoderConfig {
        address_radix: AddressRadix::Hex,
        ..DecoderConfig::default()
    });
    let m = msg(json!({"msg_type": "SG", "area_id": "CA", "address": "C6", "data": "01020304"}));
    let addresses: Vec<u32> = d
        .decode(&m)
        .unwrap()
        .into_iter()
        .filter_map(|e| match e {
            Event::SignalByte { address, .. } => Some(address),
            _ => None,
        })
        .collect();
    assert_eq!(addresses, vec![198, 199, 200]);
}

#[test]
fn configured_area_and_limit_apply() {
    let d = Decoder::new(DecoderConfig {
        area_id: "WY".into(),
        max_address: 10,
        address_radix: AddressRadix::Decimal,
    });
    let m = msg(json!({"msg_type": "SG", "area_id": "WY", "address": "9", "data": "01020304"}));
    assert_eq!(d.decode(&m).unwrap(), vec![signal(9, "01", None), signal(10, "02", None)]);
}

#[test]
fn bad_fields_report_field_decode() {
    let d = Decoder::default();
    let cases = [
        json!({"msg_type": "SF", "area_id": "CA", "data": "01"}),
        json!({"msg_type": "SF", "area_id": "CA", "address": "-1", "data": "01"}),
        json!({"msg_type": "SF", "area_id": "CA", "address": 1.5, "data": "01"}),
        json!({"msg_type": "SF", "area_id": "CA", "address": "1", "data": "0102"}),
        json!({"msg_type": "SF", "area_id": "CA", "address": "1"}),
        json!({"msg_type": "SG", "area_id": "CA", "address": "1", "data": "é0"}),
        json!({"msg_type": "CC", "area_id": "CA", "to": "0001", "descr": 42}),
    ];
    for c in cases {
        let err = d.decode(&msg(c.clone())).expect_err("expected failure");
        assert_eq!(err.code(), ErrorCode::FieldDecode, "case={c}");
    }
}
