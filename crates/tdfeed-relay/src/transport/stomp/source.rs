//! Reconnecting STOMP batch source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tdfeed_core::error::{Result, TdFeedError};

use super::client::{StompConnection, StompSettings};
use super::frame::Frame;
use crate::obs::metrics::RelayMetrics;
use crate::transport::{AckHandle, BatchSource, Delivery};

/// Exponential reconnect policy.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    /// Consecutive failures tolerated; zero retries forever.
    pub max_attempts: u32,
}

impl Backoff {
    /// Delay after the `attempt`-th consecutive failure (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts != 0 && attempt >= self.max_attempts
    }
}

pub struct StompSource {
    settings: StompSettings,
    backoff: Backoff,
    conn: Option<StompConnection>,
    metrics: Arc<RelayMetrics>,
}

impl StompSource {
    pub fn new(settings: StompSettings, backoff: Backoff, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            settings,
            backoff,
            conn: None,
            metrics,
        }
    }

    async fn connect(&mut self) -> Result<StompConnection> {
        let mut attempt = 0u32;
        loop {
            match StompConnection::open(&self.settings).await {
                Ok(conn) => {
                    self.metrics.set_connected(true);
                    return Ok(conn);
                }
                Err(e) => {
                    attempt += 1;
                    self.metrics.reconnects.inc(&[("code", e.code().as_str())]);
                    if self.backoff.exhausted(attempt) {
                        tracing::error!(error = %e, attempt, "giving up on feed connection");
                        return Err(TdFeedError::ConnectFailed { attempts: attempt });
                    }
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        "feed connection failed"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn delivery(&self, frame: Frame) -> Delivery {
        let ack = if self.settings.durable {
            let id = frame.get("ack").or_else(|| frame.get("message-id"));
            match id {
                Some(id) => Some(AckHandle {
                    id: id.to_owned(),
                    subscription: frame.get("subscription").unwrap_or("1").to_owned(),
                }),
                None => {
                    tracing::warn!("durable delivery without ack or message-id header");
                    None
                }
            }
        } else {
            None
        };

        Delivery {
            destination: frame.get("destination").unwrap_or_default().to_owned(),
            ack,
            body: frame.body,
        }
    }

    fn drop_connection(&mut self) {
        self.conn = None;
        self.metrics.set_connected(false);
    }
}

#[async_trait]
impl BatchSource for StompSource {
    async fn next_batch(&mut self) -> Result<Option<Delivery>> {
        loop {
            if self.conn.is_none() {
                let conn = self.connect().await?;
                self.conn = Some(conn);
            }
            let Some(conn) = self.conn.as_mut() else {
                continue;
            };

            match conn.next_message().await {
                Ok(frame) => return Ok(Some(self.delivery(frame))),
                Err(e) => {
                    tracing::warn!(error = %e, "feed connection lost, reconnecting");
                    self.drop_connection();
                }
            }
        }
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<()> {
        let Some(handle) = &delivery.ack else {
            return Ok(());
        };
        let Some(conn) = self.conn.as_mut() else {
            tracing::debug!(id = %handle.id, "connection gone, broker will redeliver");
            return Ok(());
        };
        if let Err(e) = conn.ack(&handle.id, &handle.subscription).await {
            tracing::warn!(error = %e, id = %handle.id, "ack failed, reconnecting");
            self.drop_connection();
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close().await;
        }
        self.metrics.set_connected(false);
    }
}
