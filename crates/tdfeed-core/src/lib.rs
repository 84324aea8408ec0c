//! tdfeed core: train describer message decoding, error types, and the line format.
//!
//! This crate turns batches of TD feed JSON into an ordered stream of
//! [`protocol::Event`]s and renders them as text lines. It carries no transport
//! or runtime dependencies so the same decoder backs the live relay, replay
//! tooling and downstream line readers.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! A malformed batch or a bad field surfaces as `TdFeedError` so one bad
//! message on the feed cannot take the relay down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, Result, TdFeedError};
