//! TCP forwarding sink.
//!
//! Map clients connect, send a single connection-type byte (`1` = forwarding)
//! and then receive every line written after that point. A client that falls
//! behind the broadcast queue is disconnected instead of stalling the relay.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use tdfeed_core::error::Result;

use crate::obs::metrics::RelayMetrics;
use crate::sink::LineSink;

pub const FORWARDING_CONNECTION: u8 = 1;

const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ForwardSink {
    tx: broadcast::Sender<Arc<str>>,
    local_addr: SocketAddr,
}

impl ForwardSink {
    /// Bind the listener and start accepting clients in the background.
    pub async fn bind(listen: &str, queue: usize, metrics: Arc<RelayMetrics>) -> Result<Self> {
        let listener = TcpListener::bind(listen).await?;
        let local_addr = listener.local_addr()?;
        let (tx, _) = broadcast::channel(queue.max(1));

        tracing::info!(%local_addr, "forwarding sink listening");
        tokio::spawn(accept_loop(listener, tx.clone(), metrics));

        Ok(Self { tx, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl LineSink for ForwardSink {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        // No subscribers is not an error: lines are only for connected clients.
        let _ = self.tx.send(Arc::from(line));
        Ok(())
    }
}

async fn accept_loop(listener: TcpListener, tx: broadcast::Sender<Arc<str>>, metrics: Arc<RelayMetrics>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                stream.set_nodelay(true).ok();
                tokio::spawn(serve_client(stream, peer, tx.clone(), Arc::clone(&metrics)));
            }
            Err(e) => tracing::warn!(error = %e, "forwarding accept failed"),
        }
    }
}

async fn serve_client(
    mut stream: TcpStream,
    peer: SocketAddr,
    tx: broadcast::Sender<Arc<str>>,
    metrics: Arc<RelayMetrics>,
) {
    let mut hello = [0u8; 1];
    match tokio::time::timeout(HELLO_TIMEOUT, stream.read_exact(&mut hello)).await {
        Ok(Ok(_)) if hello[0] == FORWARDING_CONNECTION => {}
        Ok(Ok(_)) => {
            tracing::warn!(%peer, kind = hello[0], "unsupported connection type");
            return;
        }
        Ok(Err(e)) => {
            tracing::debug!(%peer, error = %e, "client left before hello");
            return;
        }
        Err(_) => {
            tracing::warn!(%peer, "client sent no connection type");
            return;
        }
    }

    let mut rx = tx.subscribe();
    drop(tx);
    metrics.forward_clients.inc(&[]);
    tracing::info!(%peer, "forwarding client connected");

    loop {
        match rx.recv().await {
            Ok(line) => {
                let mut buf = Vec::with_capacity(line.len() + 1);
                buf.extend_from_slice(line.as_bytes());
                buf.push(b'\n');
                if let Err(e) = stream.write_all(&buf).await {
                    tracing::info!(%peer, error = %e, "forwarding client disconnected");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(%peer, skipped, "forwarding client too slow, dropping");
                break;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    metrics.forward_clients.dec(&[]);
}
