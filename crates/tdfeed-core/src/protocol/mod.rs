//! TD protocol modules.
//!
//! - `message`: the loosely-typed inner message and its type codes.
//! - `batch`: unwraps a raw payload into messages (whole-batch validation).
//! - `decode`: message -> events, including refresh byte splitting.
//! - `event`: the normalized event model.
//! - `line`: the stable text line format (render and parse).
//!
//! All parsers are panic-free: malformed input is reported as `TdFeedError`.

pub mod batch;
pub mod decode;
pub mod event;
pub mod line;
pub mod message;

pub use batch::parse_batch;
pub use decode::{AddressRadix, BatchOutcome, Decoder, DecoderConfig, MessageFailure};
pub use event::Event;
pub use line::{parse_line, FeedLine, LineFormat, LineFormatter};
pub use message::{MsgType, RawMessage};
