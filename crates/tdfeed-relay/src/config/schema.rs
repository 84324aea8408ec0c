use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use tdfeed_core::error::{Result, TdFeedError};
use tdfeed_core::protocol::decode::{DEFAULT_AREA_ID, DEFAULT_MAX_ADDRESS};
use tdfeed_core::protocol::{AddressRadix, DecoderConfig, LineFormat};

use crate::transport::stomp::Backoff;

fn invalid(msg: impl Into<String>) -> TdFeedError {
    TdFeedError::InvalidConfig(msg.into())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub decoder: DecoderSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub ops: Option<OpsSection>,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(invalid(format!("unsupported config version {}", self.version)));
        }

        self.source.validate()?;
        self.feed.validate(self.source.kind)?;
        self.decoder.validate()?;
        self.output.validate()?;
        if let Some(ops) = &self.ops {
            ops.validate()?;
        }

        Ok(())
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            area_id: self.decoder.area_id.clone(),
            max_address: self.decoder.max_address,
            address_radix: self.decoder.address_radix,
        }
    }

    pub fn line_format(&self) -> LineFormat {
        LineFormat {
            include_timestamp: self.output.include_timestamp,
            address_radix: self.decoder.address_radix,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Stomp,
    Replay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    #[serde(default)]
    pub kind: SourceKind,
    /// Replay input: a file of one batch per line, or `-` for stdin.
    #[serde(default)]
    pub path: Option<String>,
}

impl SourceSection {
    pub fn validate(&self) -> Result<()> {
        if self.kind == SourceKind::Replay && self.path.as_deref().map_or(true, str::is_empty) {
            return Err(invalid("source.path is required for replay"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub passcode: Option<String>,

    /// JSON array `[username, passcode, ...]`; overrides inline credentials.
    #[serde(default)]
    pub credentials_file: Option<String>,

    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default)]
    pub durable: bool,

    /// Durable client id; defaults to the username.
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Deliveries whose destination lacks this marker are skipped.
    #[serde(default = "default_destination_marker")]
    pub destination_marker: String,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default)]
    pub reconnect: ReconnectSection,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            passcode: None,
            credentials_file: None,
            topic: default_topic(),
            durable: false,
            client_id: None,
            heartbeat_ms: default_heartbeat_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            destination_marker: default_destination_marker(),
            max_frame_bytes: default_max_frame_bytes(),
            reconnect: ReconnectSection::default(),
        }
    }
}

impl FeedSection {
    pub fn validate(&self, source: SourceKind) -> Result<()> {
        if !self.topic.starts_with('/') {
            return Err(invalid("feed.topic must start with '/'"));
        }
        if self.heartbeat_ms != 0 && !(1000..=120000).contains(&self.heartbeat_ms) {
            return Err(invalid("feed.heartbeat_ms must be 0 or between 1000 and 120000"));
        }
        if !(1000..=120000).contains(&self.connect_timeout_ms) {
            return Err(invalid("feed.connect_timeout_ms must be between 1000 and 120000"));
        }
        if self.max_frame_bytes < 1024 {
            return Err(invalid("feed.max_frame_bytes must be at least 1024"));
        }
        self.reconnect.validate()?;

        if source == SourceKind::Stomp {
            if self.host.is_empty() || self.port == 0 {
                return Err(invalid("feed.host and feed.port are required"));
            }
            let inline = self.username.is_some() && self.passcode.is_some();
            if self.credentials_file.is_none() && !inline {
                return Err(invalid(
                    "feed needs username and passcode, or credentials_file",
                ));
            }
        }
        Ok(())
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn default_host() -> String {
    "publicdatafeeds.networkrail.co.uk".into()
}
fn default_port() -> u16 {
    61618
}
fn default_topic() -> String {
    "/topic/TD_ALL_SIG_AREA".into()
}
fn default_heartbeat_ms() -> u64 {
    5000
}
fn default_connect_timeout_ms() -> u64 {
    10000
}
fn default_destination_marker() -> String {
    "TD_".into()
}
fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSection {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Consecutive failed attempts before giving up; 0 retries forever.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_attempts: 0,
        }
    }
}

impl ReconnectSection {
    pub fn validate(&self) -> Result<()> {
        if self.initial_backoff_ms == 0 {
            return Err(invalid("feed.reconnect.initial_backoff_ms must be positive"));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(invalid(
                "feed.reconnect.max_backoff_ms must be at least initial_backoff_ms",
            ));
        }
        Ok(())
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            initial: Duration::from_millis(self.initial_backoff_ms),
            max: Duration::from_millis(self.max_backoff_ms),
            max_attempts: self.max_attempts,
        }
    }
}

fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    60000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderSection {
    #[serde(default = "default_area_id")]
    pub area_id: String,

    #[serde(default = "default_max_address")]
    pub max_address: u32,

    #[serde(default)]
    pub address_radix: AddressRadix,
}

impl Default for DecoderSection {
    fn default() -> Self {
        Self {
            area_id: default_area_id(),
            max_address: default_max_address(),
            address_radix: AddressRadix::default(),
        }
    }
}

impl DecoderSection {
    pub fn validate(&self) -> Result<()> {
        if self.area_id.is_empty() {
            return Err(invalid("decoder.area_id must not be empty"));
        }
        Ok(())
    }
}

fn default_area_id() -> String {
    DEFAULT_AREA_ID.into()
}
fn default_max_address() -> u32 {
    DEFAULT_MAX_ADDRESS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Stdout,
    Forward,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default)]
    pub kind: OutputKind,

    /// Listen address for the forwarding sink.
    #[serde(default = "default_forward_listen")]
    pub listen: String,

    /// Lines buffered per forwarding client before it is dropped.
    #[serde(default = "default_forward_queue")]
    pub queue: usize,

    #[serde(default)]
    pub include_timestamp: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            kind: OutputKind::default(),
            listen: default_forward_listen(),
            queue: default_forward_queue(),
            include_timestamp: false,
        }
    }
}

impl OutputSection {
    pub fn validate(&self) -> Result<()> {
        if self.kind == OutputKind::Forward {
            self.listen
                .parse::<SocketAddr>()
                .map_err(|e| invalid(format!("output.listen {:?}: {e}", self.listen)))?;
            if self.queue == 0 {
                return Err(invalid("output.queue must be positive"));
            }
        }
        Ok(())
    }
}

fn default_forward_listen() -> String {
    "127.0.0.1:6363".into()
}
fn default_forward_queue() -> usize {
    4096
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpsSection {
    pub listen: String,
}

impl OpsSection {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<SocketAddr>()
            .map_err(|e| invalid(format!("ops.listen {:?}: {e}", self.listen)))?;
        Ok(())
    }
}
