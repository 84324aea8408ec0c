//! TD message decoder (panic-free).
//!
//! Decoding rules:
//! - Messages for other areas, heartbeats and unknown types yield no events.
//! - Refresh payloads hold up to 4 bytes; byte `i` belongs to `address + i`.
//!   Splitting stops at the first address above `max_address`.
//! - A refresh run starting at address 0 is preceded by `RefreshStarted`;
//!   `SH` is always followed by `RefreshFinished`.
//! - A bad field fails that message only and emits nothing for it.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, TdFeedError};
use crate::protocol::event::Event;
use crate::protocol::message::{MsgType, RawMessage};

/// Bytes carried by one refresh message (8 hex characters).
pub const MAX_REFRESH_BYTES: usize = 4;

/// Highest signalling address of the Cambridge PSB area.
pub const DEFAULT_MAX_ADDRESS: u32 = 200;

pub const DEFAULT_AREA_ID: &str = "CA";

/// How string addresses are read (and rendered by the line formatter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressRadix {
    #[default]
    Decimal,
    Hex,
}

impl AddressRadix {
    pub fn radix(self) -> u32 {
        match self {
            AddressRadix::Decimal => 10,
            AddressRadix::Hex => 16,
        }
    }
}

/// Immutable decoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Only messages for this area are decoded.
    pub area_id: String,
    /// Bytes addressed above this are dropped.
    pub max_address: u32,
    pub address_radix: AddressRadix,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            area_id: DEFAULT_AREA_ID.into(),
            max_address: DEFAULT_MAX_ADDRESS,
            address_radix: AddressRadix::Decimal,
        }
    }
}

/// A message that failed to decode, by position in its batch.
#[derive(Debug)]
pub struct MessageFailure {
    pub index: usize,
    pub msg_type: Option<String>,
    pub error: TdFeedError,
}

/// Result of decoding a whole batch with per-message isolation.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub events: Vec<Event>,
    pub failures: Vec<MessageFailure>,
}

/// Stateless TD decoder. Output depends only on the message and the config.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    cfg: DecoderConfig,
}

impl Decoder {
    pub fn new(cfg: DecoderConfig) -> Self {
        Self { cfg }
    }

    /// Decode one message into zero or more events.
    pub fn decode(&self, msg: &RawMessage) -> Result<Vec<Event>> {
        if msg.area_id() != Some(self.cfg.area_id.as_str()) {
            return Ok(Vec::new());
        }
        let Some(kind) = msg.kind() else {
            return Ok(Vec::new());
        };

        match kind {
            MsgType::BerthStep | MsgType::BerthCancel | MsgType::BerthInterpose => {
                Ok(vec![berth_transition(msg)?])
            }
            MsgType::SignallingUpdate => self.signalling_update(msg),
            MsgType::SignallingRefresh | MsgType::SignallingRefreshFinished => {
                self.signalling_refresh(kind, msg)
            }
            MsgType::Heartbeat => Ok(Vec::new()),
        }
    }

    /// Decode every message of a batch, in order. Failed messages are
    /// reported and skipped; the rest still produce their events.
    pub fn decode_batch(&self, msgs: &[RawMessage]) -> BatchOutcome {
        let mut out = BatchOutcome::default();
        for (index, msg) in msgs.iter().enumerate() {
            match self.decode(msg) {
                Ok(events) => out.events.extend(events),
                Err(error) => out.failures.push(MessageFailure {
                    index,
                    msg_type: msg.msg_type().map(str::to_owned),
                    error,
                }),
            }
        }
        out
    }

    fn signalling_update(&self, msg: &RawMessage) -> Result<Vec<Event>> {
        let address = self.address(msg)?;
        let data = msg.req_str("data")?;
        if data.len() != 2 {
            return Err(TdFeedError::field(
                "data",
                format!("expected one hex byte, got {:?}", data),
            ));
        }
        hex_byte(data)?;

        if address > self.cfg.max_address {
            return Ok(Vec::new());
        }

        Ok(vec![Event::SignalByte {
            address,
            value: data.to_owned(),
            time: msg.time(),
        }])
    }

    fn signalling_refresh(&self, kind: MsgType, msg: &RawMessage) -> Result<Vec<Event>> {
        let start = self.address(msg)?;
        let data = msg.req_str("data")?;
        if !data.is_ascii() || data.len() % 2 != 0 {
            return Err(TdFeedError::field(
                "data",
                format!("expected pairs of hex digits, got {:?}", data),
            ));
        }

        let time = msg.time();
        let mut events = Vec::with_capacity(MAX_REFRESH_BYTES + 2);

        if start == 0 {
            events.push(Event::RefreshStarted);
        }

        for offset in 0..(data.len() / 2).min(MAX_REFRESH_BYTES) {
            let address = match start.checked_add(offset as u32) {
                Some(a) if a <= self.cfg.max_address => a,
                _ => break,
            };
            let chunk = data
                .get(offset * 2..offset * 2 + 2)
                .ok_or_else(|| TdFeedError::field("data", "truncated byte"))?;
            hex_byte(chunk)?;

            events.push(Event::SignalByte {
                address,
                value: chunk.to_owned(),
                time: time.clone(),
            });
        }

        if kind == MsgType::SignallingRefreshFinished {
            events.push(Event::RefreshFinished);
        }

        Ok(events)
    }

    /// Addresses arrive as JSON numbers or as digit strings in the configured radix.
    fn address(&self, msg: &RawMessage) -> Result<u32> {
        match msg.get("address") {
            None => Err(TdFeedError::field("address", "missing")),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| TdFeedError::field("address", format!("out of range: {n}"))),
            Some(Value::String(s)) => {
                let radix = self.cfg.address_radix.radix();
                if s.is_empty() || !s.chars().all(|c| c.is_digit(radix)) {
                    return Err(TdFeedError::field(
                        "address",
                        format!("not a base-{radix} number: {:?}", s),
                    ));
                }
                u32::from_str_radix(s, radix)
                    .map_err(|e| TdFeedError::field("address", e.to_string()))
            }
            Some(other) => Err(TdFeedError::field(
                "address",
                format!("expected number or string, got {other}"),
            )),
        }
    }
}

fn berth_transition(msg: &RawMessage) -> Result<Event> {
    Ok(Event::BerthTransition {
        from: msg.opt_str("from")?.map(str::to_owned),
        to: msg.opt_str("to")?.map(str::to_owned),
        describer: msg.opt_str("descr")?.map(str::to_owned),
        time: msg.time(),
    })
}

fn hex_byte(chunk: &str) -> Result<u8> {
    let mut byte = [0u8; 1];
    hex::decode_to_slice(chunk, &mut byte)
        .map_err(|e| TdFeedError::field("data", format!("{:?}: {e}", chunk)))?;
    Ok(byte[0])
}
