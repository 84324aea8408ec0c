//! Line format shared with downstream map clients.
//!
//! ```text
//! C,<from>,<to>,<describer>     berth transition (NONE for a missing berth)
//! S,<address>,<byte>            signalling byte, two hex chars as received
//! MSG:1                         refresh started
//! MSG:2                         refresh finished
//! MSG:-1                        feed connection failed (written by the relay)
//! ```
//!
//! With `include_timestamp` the feed time follows the type letter:
//! `C,<time>,<from>,<to>,<describer>` and `S,<time>,<address>,<byte>`.

use crate::error::{Result, TdFeedError};
use crate::protocol::decode::AddressRadix;
use crate::protocol::event::Event;

pub const NO_BERTH: &str = "NONE";
pub const REFRESH_STARTED_LINE: &str = "MSG:1";
pub const REFRESH_FINISHED_LINE: &str = "MSG:2";
pub const CONNECT_FAILED_LINE: &str = "MSG:-1";

/// Rendering options, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineFormat {
    pub include_timestamp: bool,
    pub address_radix: AddressRadix,
}

#[derive(Debug, Clone, Default)]
pub struct LineFormatter {
    fmt: LineFormat,
}

impl LineFormatter {
    pub fn new(fmt: LineFormat) -> Self {
        Self { fmt }
    }

    /// Render one event as one line (no trailing newline).
    pub fn format(&self, event: &Event) -> String {
        match event {
            Event::BerthTransition {
                from,
                to,
                describer,
                time,
            } => {
                let from = from.as_deref().unwrap_or(NO_BERTH);
                let to = to.as_deref().unwrap_or(NO_BERTH);
                let describer = describer.as_deref().unwrap_or("");
                if self.fmt.include_timestamp {
                    format!("C,{},{from},{to},{describer}", time.as_deref().unwrap_or(""))
                } else {
                    format!("C,{from},{to},{describer}")
                }
            }
            Event::SignalByte {
                address,
                value,
                time,
            } => {
                let address = self.address(*address);
                if self.fmt.include_timestamp {
                    format!("S,{},{address},{value}", time.as_deref().unwrap_or(""))
                } else {
                    format!("S,{address},{value}")
                }
            }
            Event::RefreshStarted => REFRESH_STARTED_LINE.to_owned(),
            Event::RefreshFinished => REFRESH_FINISHED_LINE.to_owned(),
        }
    }

    fn address(&self, address: u32) -> String {
        match self.fmt.address_radix {
            AddressRadix::Decimal => address.to_string(),
            AddressRadix::Hex => format!("{address:x}"),
        }
    }
}

/// A line read back from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLine {
    Event(Event),
    ConnectFailed,
}

/// Parse one line of the default format (no timestamps, decimal addresses).
pub fn parse_line(line: &str) -> Result<FeedLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line {
        REFRESH_STARTED_LINE => return Ok(FeedLine::Event(Event::RefreshStarted)),
        REFRESH_FINISHED_LINE => return Ok(FeedLine::Event(Event::RefreshFinished)),
        CONNECT_FAILED_LINE => return Ok(FeedLine::ConnectFailed),
        _ => {}
    }

    let parts: Vec<&str> = line.split(',').collect();
    match parts.as_slice() {
        ["C", from, to, describer] => Ok(FeedLine::Event(Event::BerthTransition {
            from: berth(from),
            to: berth(to),
            describer: (!describer.is_empty()).then(|| describer.to_string()),
            time: None,
        })),
        ["S", address, value] => {
            let address = address
                .parse::<u32>()
                .map_err(|e| TdFeedError::MalformedLine(format!("address {:?}: {e}", address)))?;
            if value.len() != 2 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(TdFeedError::MalformedLine(format!(
                    "byte {:?} is not two hex digits",
                    value
                )));
            }
            Ok(FeedLine::Event(Event::SignalByte {
                address,
                value: value.to_string(),
                time: None,
            }))
        }
        _ => Err(TdFeedError::MalformedLine(format!("unrecognised line {:?}", line))),
    }
}

fn berth(s: &str) -> Option<String> {
    (s != NO_BERTH).then(|| s.to_string())
}
