//! Relay wiring: config -> source, sink, ops endpoint, pipeline.

use std::sync::Arc;

use tdfeed_core::error::{Result, TdFeedError};
use tdfeed_core::protocol::line::CONNECT_FAILED_LINE;

use crate::config::{self, OutputKind, RelayConfig, SourceKind};
use crate::obs::metrics::RelayMetrics;
use crate::ops;
use crate::pipeline::Relay;
use crate::sink::{ForwardSink, LineSink, WriterSink};
use crate::transport::{BatchSource, ReplaySource, StompSource};

/// Run the relay until the feed ends, ctrl-c, or a fatal error.
///
/// When the broker stays unreachable the sink receives the `MSG:-1` status
/// line before the error is returned.
pub async fn run(cfg: RelayConfig) -> Result<()> {
    let metrics = Arc::new(RelayMetrics::default());

    if let Some(ops_cfg) = &cfg.ops {
        let listener = tokio::net::TcpListener::bind(&ops_cfg.listen).await?;
        let app = ops::build_router(Arc::clone(&metrics));
        tracing::info!(listen = %ops_cfg.listen, "ops endpoint starting");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "ops endpoint stopped");
            }
        });
    }

    let mut sink: Box<dyn LineSink> = match cfg.output.kind {
        OutputKind::Stdout => Box::new(WriterSink::stdout()),
        OutputKind::Forward => Box::new(
            ForwardSink::bind(&cfg.output.listen, cfg.output.queue, Arc::clone(&metrics)).await?,
        ),
    };

    let mut source: Box<dyn BatchSource> = match cfg.source.kind {
        SourceKind::Stomp => Box::new(StompSource::new(
            config::stomp_settings(&cfg.feed)?,
            cfg.feed.reconnect.backoff(),
            Arc::clone(&metrics),
        )),
        SourceKind::Replay => {
            let path = cfg.source.path.as_deref().unwrap_or("-");
            tracing::info!(path, "replaying recorded batches");
            metrics.set_connected(true);
            Box::new(ReplaySource::open(path, cfg.feed.topic.clone()).await?)
        }
    };

    let relay = Relay::from_config(&cfg, Arc::clone(&metrics));
    let res = relay
        .run(source.as_mut(), sink.as_mut(), shutdown_signal())
        .await;

    if let Err(TdFeedError::ConnectFailed { .. }) = &res {
        sink.write_line(CONNECT_FAILED_LINE).await?;
    }

    tracing::info!(
        batches = metrics.batches.total(),
        events = metrics.events.total(),
        message_errors = metrics.message_errors.total(),
        "relay stopped"
    );
    res
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
