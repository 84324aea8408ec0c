//! STOMP 1.2 frames.

use bytes::Bytes;

pub const CONNECT: &str = "CONNECT";
pub const CONNECTED: &str = "CONNECTED";
pub const SUBSCRIBE: &str = "SUBSCRIBE";
pub const MESSAGE: &str = "MESSAGE";
pub const ACK: &str = "ACK";
pub const ERROR: &str = "ERROR";
pub const DISCONNECT: &str = "DISCONNECT";

/// One decoded (or to-be-encoded) frame. Header order is preserved; on
/// repeated keys the first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Frame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT/CONNECTED headers are sent without escaping.
    pub fn escapes_headers(&self) -> bool {
        self.command != CONNECT && self.command != CONNECTED
    }
}

/// Unit read from or written to the wire: a frame or a heart-beat EOL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StompItem {
    Frame(Frame),
    Heartbeat,
}
