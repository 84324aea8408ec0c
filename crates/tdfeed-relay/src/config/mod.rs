//! Relay config loader (strict parsing).

pub mod schema;

use std::fs;

use tdfeed_core::error::{Result, TdFeedError};

use crate::transport::stomp::StompSettings;

pub use schema::{
    DecoderSection, FeedSection, OpsSection, OutputKind, OutputSection, ReconnectSection,
    RelayConfig, SourceKind, SourceSection,
};

pub const DEFAULT_CONFIG_PATH: &str = "tdfeed.yaml";

pub fn load_from_file(path: &str) -> Result<RelayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TdFeedError::InvalidConfig(format!("read {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg: RelayConfig = serde_yaml::from_str(s)
        .map_err(|e| TdFeedError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Username and passcode, from `credentials_file` when set.
pub fn credentials(feed: &FeedSection) -> Result<(String, String)> {
    if let Some(path) = &feed.credentials_file {
        let s = fs::read_to_string(path)
            .map_err(|e| TdFeedError::InvalidConfig(format!("read {path} failed: {e}")))?;
        return parse_credentials(&s);
    }
    match (&feed.username, &feed.passcode) {
        (Some(u), Some(p)) => Ok((u.clone(), p.clone())),
        _ => Err(TdFeedError::InvalidConfig(
            "feed needs username and passcode, or credentials_file".into(),
        )),
    }
}

/// Credentials file body: a JSON array whose first two entries are the
/// username and passcode. Extra entries are ignored.
pub fn parse_credentials(s: &str) -> Result<(String, String)> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(s)
        .map_err(|e| TdFeedError::InvalidConfig(format!("credentials file: {e}")))?;
    match entries.as_slice() {
        [serde_json::Value::String(u), serde_json::Value::String(p), ..] => {
            Ok((u.clone(), p.clone()))
        }
        _ => Err(TdFeedError::InvalidConfig(
            "credentials file must start with [username, passcode]".into(),
        )),
    }
}

pub fn stomp_settings(feed: &FeedSection) -> Result<StompSettings> {
    let (login, passcode) = credentials(feed)?;
    Ok(StompSettings {
        host: feed.host.clone(),
        port: feed.port,
        client_id: feed.client_id.clone().unwrap_or_else(|| login.clone()),
        login,
        passcode,
        topic: feed.topic.clone(),
        durable: feed.durable,
        heartbeat: feed.heartbeat(),
        connect_timeout: feed.connect_timeout(),
        max_frame_bytes: feed.max_frame_bytes,
    })
}
