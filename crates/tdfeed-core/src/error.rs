//! Shared error type across tdfeed crates.

use thiserror::Error;

/// Stable error codes (used in logs, metrics labels and test vectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Payload is not an array of single-key envelopes.
    MalformedBatch,
    /// A field inside one message could not be decoded.
    FieldDecode,
    /// An output line could not be parsed back.
    MalformedLine,
    /// Configuration rejected at load time.
    InvalidConfig,
    /// Broker connection or protocol failure.
    Transport,
    /// Gave up connecting to the broker.
    ConnectFailed,
    /// Local I/O failure (sinks, replay files).
    Io,
}

impl ErrorCode {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedBatch => "MALFORMED_BATCH",
            ErrorCode::FieldDecode => "FIELD_DECODE",
            ErrorCode::MalformedLine => "MALFORMED_LINE",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::ConnectFailed => "CONNECT_FAILED",
            ErrorCode::Io => "IO",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TdFeedError>;

/// Unified error type used by core and relay.
#[derive(Debug, Error)]
pub enum TdFeedError {
    #[error("malformed batch: {0}")]
    MalformedBatch(String),
    #[error("cannot decode field `{field}`: {reason}")]
    FieldDecode { field: &'static str, reason: String },
    #[error("malformed line: {0}")]
    MalformedLine(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("connect failed after {attempts} attempts")]
    ConnectFailed { attempts: u32 },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl TdFeedError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        TdFeedError::FieldDecode {
            field,
            reason: reason.into(),
        }
    }

    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            TdFeedError::MalformedBatch(_) => ErrorCode::MalformedBatch,
            TdFeedError::FieldDecode { .. } => ErrorCode::FieldDecode,
            TdFeedError::MalformedLine(_) => ErrorCode::MalformedLine,
            TdFeedError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            TdFeedError::Transport(_) => ErrorCode::Transport,
            TdFeedError::ConnectFailed { .. } => ErrorCode::ConnectFailed,
            TdFeedError::Io(_) => ErrorCode::Io,
        }
    }
}
