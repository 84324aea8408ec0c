//! Feed transports.
//!
//! The relay pulls batches through [`BatchSource`]: a live STOMP subscription
//! or a replay of recorded payloads. `Ok(None)` means batches stopped arriving
//! and is a normal end of stream.

pub mod replay;
pub mod stomp;

use async_trait::async_trait;
use bytes::Bytes;

use tdfeed_core::error::Result;

pub use replay::ReplaySource;
pub use stomp::StompSource;

/// Broker handle needed to acknowledge one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckHandle {
    pub id: String,
    pub subscription: String,
}

/// One raw batch as delivered by the transport.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub destination: String,
    /// `None` when the subscription does not require acks.
    pub ack: Option<AckHandle>,
    pub body: Bytes,
}

#[async_trait]
pub trait BatchSource: Send {
    /// Block until the next batch arrives. `Ok(None)` ends the stream.
    async fn next_batch(&mut self) -> Result<Option<Delivery>>;

    /// Acknowledge a delivery once its events have been emitted.
    async fn ack(&mut self, delivery: &Delivery) -> Result<()>;

    /// Release the connection, if any.
    async fn close(&mut self) {}
}
