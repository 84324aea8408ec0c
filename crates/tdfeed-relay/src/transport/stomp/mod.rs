//! STOMP 1.2 feed transport.
//!
//! `codec` frames bytes, `client` drives one connection, `source` adds
//! reconnection with exponential backoff and exposes it as a `BatchSource`.

pub mod client;
pub mod codec;
pub mod frame;
pub mod source;

pub use client::{StompConnection, StompSettings};
pub use codec::StompCodec;
pub use frame::{Frame, StompItem};
pub use source::{Backoff, StompSource};
