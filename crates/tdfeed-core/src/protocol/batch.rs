//! Batch unwrapping.
//!
//! A feed payload is a JSON array of single-key objects, e.g.
//! `[{"CA_MSG": {...}}, {"SF_MSG": {...}}]`. The key repeats `msg_type` and is
//! ignored. Any shape violation rejects the whole batch.

use serde_json::Value;

use crate::error::{Result, TdFeedError};
use crate::protocol::message::RawMessage;

/// Parse a raw payload into its inner messages, in order.
pub fn parse_batch(payload: &[u8]) -> Result<Vec<RawMessage>> {
    let root: Value = serde_json::from_slice(payload)
        .map_err(|e| TdFeedError::MalformedBatch(format!("invalid json: {e}")))?;

    let Value::Array(items) = root else {
        return Err(TdFeedError::MalformedBatch(format!(
            "expected array, got {}",
            kind_of(&root)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| unwrap_envelope(i, item))
        .collect()
}

fn unwrap_envelope(index: usize, item: Value) -> Result<RawMessage> {
    let Value::Object(envelope) = item else {
        return Err(TdFeedError::MalformedBatch(format!(
            "element {index}: expected object, got {}",
            kind_of(&item)
        )));
    };

    if envelope.len() != 1 {
        return Err(TdFeedError::MalformedBatch(format!(
            "element {index}: expected a single key, got {}",
            envelope.len()
        )));
    }

    match envelope.into_iter().next() {
        Some((_, Value::Object(fields))) => Ok(RawMessage::new(fields)),
        Some((key, other)) => Err(TdFeedError::MalformedBatch(format!(
            "element {index}: `{key}` holds {}, expected object",
            kind_of(&other)
        ))),
        None => Err(TdFeedError::MalformedBatch(format!(
            "element {index}: empty envelope"
        ))),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
