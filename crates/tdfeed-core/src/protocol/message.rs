//! Inner TD message (the value of each batch envelope).
//!
//! The feed sends one JSON object per message with a field set that depends on
//! `msg_type`, so the message is kept as a JSON object and read through typed
//! accessors instead of a fixed struct.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, TdFeedError};

/// TD message type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    /// `CA`: description moves from `from` into `to`.
    BerthStep,
    /// `CB`: description erased from `from`.
    BerthCancel,
    /// `CC`: description inserted into `to`.
    BerthInterpose,
    /// `CT`: describer heartbeat.
    Heartbeat,
    /// `SF`: a single signalling byte changed.
    SignallingUpdate,
    /// `SG`: part of a periodic refresh (up to 4 bytes).
    SignallingRefresh,
    /// `SH`: last part of a periodic refresh.
    SignallingRefreshFinished,
}

impl MsgType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CA" => Some(MsgType::BerthStep),
            "CB" => Some(MsgType::BerthCancel),
            "CC" => Some(MsgType::BerthInterpose),
            "CT" => Some(MsgType::Heartbeat),
            "SF" => Some(MsgType::SignallingUpdate),
            "SG" => Some(MsgType::SignallingRefresh),
            "SH" => Some(MsgType::SignallingRefreshFinished),
            _ => None,
        }
    }
}

/// One inner message of a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawMessage(Map<String, Value>);

impl RawMessage {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw `msg_type` code, if present as a string.
    pub fn msg_type(&self) -> Option<&str> {
        self.0.get("msg_type").and_then(Value::as_str)
    }

    /// Parsed message type. `None` for missing or unknown codes.
    pub fn kind(&self) -> Option<MsgType> {
        self.msg_type().and_then(MsgType::from_code)
    }

    pub fn area_id(&self) -> Option<&str> {
        self.0.get("area_id").and_then(Value::as_str)
    }

    /// Timestamp passed through as text. Strings are kept verbatim, numbers
    /// use their JSON rendering, anything else counts as absent.
    pub fn time(&self) -> Option<String> {
        match self.0.get("time")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Raw field value; JSON `null` counts as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Optional string field. Present-but-not-a-string is a decode error.
    pub fn opt_str(&self, field: &'static str) -> Result<Option<&str>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(TdFeedError::field(
                field,
                format!("expected string, got {other}"),
            )),
        }
    }

    /// Required string field.
    pub fn req_str(&self, field: &'static str) -> Result<&str> {
        self.opt_str(field)?
            .ok_or_else(|| TdFeedError::field(field, "missing"))
    }
}

impl From<Map<String, Value>> for RawMessage {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
