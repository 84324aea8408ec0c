//! Output sinks for event lines.
//!
//! Every line is flushed as soon as it is written: downstream map clients read
//! the stream live.

pub mod forward;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use tdfeed_core::error::Result;

pub use forward::ForwardSink;

#[async_trait]
pub trait LineSink: Send {
    /// Write one line (without trailing newline) and flush it.
    async fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Sink over any async writer (stdout in production).
pub struct WriterSink<W> {
    inner: W,
}

impl<W> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl WriterSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> LineSink for WriterSink<W> {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.write_all(b"\n").await?;
        self.inner.flush().await?;
        Ok(())
    }
}
