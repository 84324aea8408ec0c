//! Replay of recorded feed payloads, one JSON batch per line.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use tdfeed_core::error::Result;

use crate::transport::{BatchSource, Delivery};

/// Reads batches from a file, or from stdin when the path is `-`. Blank lines
/// are skipped; end of input ends the stream.
pub struct ReplaySource {
    lines: Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>,
    destination: String,
    line_no: u64,
}

impl ReplaySource {
    pub async fn open(path: &str, destination: impl Into<String>) -> Result<Self> {
        let reader: Box<dyn AsyncRead + Send + Unpin> = if path == "-" {
            Box::new(tokio::io::stdin())
        } else {
            Box::new(tokio::fs::File::open(path).await?)
        };
        Ok(Self::from_reader(reader, destination))
    }

    pub fn from_reader(reader: Box<dyn AsyncRead + Send + Unpin>, destination: impl Into<String>) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            destination: destination.into(),
            line_no: 0,
        }
    }
}

#[async_trait]
impl BatchSource for ReplaySource {
    async fn next_batch(&mut self) -> Result<Option<Delivery>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            tracing::trace!(line = self.line_no, "replaying batch");
            return Ok(Some(Delivery {
                destination: self.destination.clone(),
                ack: None,
                body: Bytes::from(line),
            }));
        }
        Ok(None)
    }

    async fn ack(&mut self, _delivery: &Delivery) -> Result<()> {
        Ok(())
    }
}
