//! Relay pipeline: source -> batch parser -> decoder -> formatter -> sink -> ack.
//!
//! Ordering contract:
//! - events are written in batch order, one flushed line each;
//! - a delivery is acked only after all of its lines were written;
//! - a malformed batch or a batch for another destination is logged, counted
//!   and acked (redelivery cannot fix it);
//! - a bad message is skipped, the rest of its batch still goes out.

use std::future::Future;
use std::sync::Arc;

use tdfeed_core::error::Result;
use tdfeed_core::protocol::{parse_batch, Decoder, LineFormatter};

use crate::config::RelayConfig;
use crate::obs::metrics::RelayMetrics;
use crate::sink::LineSink;
use crate::transport::{BatchSource, Delivery};

pub struct Relay {
    decoder: Decoder,
    formatter: LineFormatter,
    destination_marker: String,
    metrics: Arc<RelayMetrics>,
}

impl Relay {
    pub fn new(
        decoder: Decoder,
        formatter: LineFormatter,
        destination_marker: impl Into<String>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            decoder,
            formatter,
            destination_marker: destination_marker.into(),
            metrics,
        }
    }

    pub fn from_config(cfg: &RelayConfig, metrics: Arc<RelayMetrics>) -> Self {
        Self::new(
            Decoder::new(cfg.decoder_config()),
            LineFormatter::new(cfg.line_format()),
            cfg.feed.destination_marker.clone(),
            metrics,
        )
    }

    /// Relay until the source ends or `shutdown` resolves.
    pub async fn run<S, K, F>(&self, source: &mut S, sink: &mut K, shutdown: F) -> Result<()>
    where
        S: BatchSource + ?Sized,
        K: LineSink + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    self.metrics.set_draining();
                    break;
                }
                next = source.next_batch() => next?,
            };

            let Some(delivery) = next else {
                tracing::info!("feed ended");
                break;
            };
            self.handle_delivery(source, sink, &delivery).await?;
        }

        source.close().await;
        Ok(())
    }

    /// Decode, emit and ack one delivery.
    pub async fn handle_delivery<S, K>(&self, source: &mut S, sink: &mut K, delivery: &Delivery) -> Result<()>
    where
        S: BatchSource + ?Sized,
        K: LineSink + ?Sized,
    {
        if !delivery.destination.contains(self.destination_marker.as_str()) {
            tracing::warn!(destination = %delivery.destination, "unknown destination, skipping");
            self.metrics.batches.inc(&[("outcome", "ignored")]);
            return source.ack(delivery).await;
        }

        let msgs = match parse_batch(&delivery.body) {
            Ok(msgs) => msgs,
            Err(e) => {
                tracing::warn!(error = %e, bytes = delivery.body.len(), "dropping malformed batch");
                self.metrics.batches.inc(&[("outcome", "malformed")]);
                return source.ack(delivery).await;
            }
        };

        let outcome = self.decoder.decode_batch(&msgs);
        for f in &outcome.failures {
            let msg_type = f.msg_type.as_deref().unwrap_or("unknown");
            tracing::warn!(
                index = f.index,
                msg_type,
                code = f.error.code().as_str(),
                error = %f.error,
                "message skipped"
            );
            self.metrics
                .message_errors
                .inc(&[("code", f.error.code().as_str()), ("msg_type", msg_type)]);
        }

        for event in &outcome.events {
            sink.write_line(&self.formatter.format(event)).await?;
            self.metrics.events.inc(&[("kind", event.kind())]);
        }

        tracing::debug!(
            messages = msgs.len(),
            events = outcome.events.len(),
            failures = outcome.failures.len(),
            "batch relayed"
        );
        self.metrics.batches.inc(&[("outcome", "ok")]);
        source.ack(delivery).await
    }
}
