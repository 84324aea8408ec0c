//! Line rendering and parsing.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tdfeed_core::protocol::line::CONNECT_FAILED_LINE;
use tdfeed_core::protocol::{parse_line, AddressRadix, Event, FeedLine, LineFormat, LineFormatter};
use tdfeed_core::ErrorCode;

fn berth(from: Option<&str>, to: Option<&str>, describer: Option<&str>) -> Event {
    Event::BerthTransition {
        from: from.map(str::to_owned),
        to: to.map(str::to_owned),
        describer: describer.map(str::to_owned),
        time: Some("1349696911000".into()),
    }
}

#[test]
fn default_format() {
    let f = LineFormatter::default();
    assert_eq!(f.format(&berth(None, None, Some("1K76"))), "C,NONE,NONE,1K76");
    assert_eq!(f.format(&berth(Some("0193"), Some("0195"), None)), "C,0193,0195,");
    assert_eq!(
        f.format(&Event::SignalByte { address: 7, value: "0d".into(), time: None }),
        "S,7,0d"
    );
    assert_eq!(f.format(&Event::RefreshStarted), "MSG:1");
    assert_eq!(f.format(&Event::RefreshFinished), "MSG:2");
}

#[test]
fn timestamped_hex_format() {
    let f = LineFormatter::new(LineFormat {
        include_timestamp: true,
        address_radix: AddressRadix::Hex,
    });
    assert_eq!(
        f.format(&berth(Some("0193"), None, Some("1K76"))),
        "C,1349696911000,0193,NONE,1K76"
    );
    assert_eq!(
        f.format(&Event::SignalByte { address: 10, value: "FF".into(), time: Some("5".into()) }),
        "S,5,a,FF"
    );
    assert_eq!(
        f.format(&Event::SignalByte { address: 163, value: "0D".into(), time: None }),
        "S,,a3,0D"
    );
}

#[test]
fn parse_inverts_default_format() {
    let f = LineFormatter::default();
    let events = [
        Event::BerthTransition { from: Some("0193".into()), to: None, describer: Some("1K76".into()), time: None },
        Event::BerthTransition { from: None, to: None, describer: None, time: None },
        Event::SignalByte { address: 200, value: "A0".into(), time: None },
        Event::RefreshStarted,
        Event::RefreshFinished,
    ];
    for e in events {
        let line = f.format(&e);
        assert_eq!(parse_line(&line).unwrap(), FeedLine::Event(e), "line={line}");
    }
}

#[test]
fn parse_status_and_line_endings() {
    assert_eq!(parse_line(CONNECT_FAILED_LINE).unwrap(), FeedLine::ConnectFailed);
    assert_eq!(
        parse_line("S,3,0F\r\n").unwrap(),
        FeedLine::Event(Event::SignalByte { address: 3, value: "0F".into(), time: None })
    );
}

#[test]
fn parse_rejects_garbage() {
    for line in ["", "MSG:3", "S,1", "S,x,0F", "S,1,0FF", "S,1,GG", "C,a,b", "X,1,2"] {
        let err = parse_line(line).expect_err("expected failure");
        assert_eq!(err.code(), ErrorCode::MalformedLine, "line={line:?}");
    }
}
