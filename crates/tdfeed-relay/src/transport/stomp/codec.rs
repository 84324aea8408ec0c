//! STOMP 1.2 wire codec (panic-free).
//!
//! Framing rules:
//! - A bare EOL between frames is a heart-beat.
//! - Frame = command line, header lines, blank line, body, NUL.
//! - With `content-length` the body is read by length (it may contain NULs),
//!   otherwise up to the first NUL.
//! - Header values are escaped except in CONNECT/CONNECTED.
//! - Frames larger than `max_frame_bytes` are a transport error.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use tdfeed_core::error::{Result, TdFeedError};

use super::frame::{Frame, StompItem, CONNECT, CONNECTED};

#[derive(Debug, Clone)]
pub struct StompCodec {
    max_frame_bytes: usize,
}

impl StompCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    fn too_large(&self, len: usize) -> Result<()> {
        if len > self.max_frame_bytes {
            return Err(TdFeedError::Transport(format!(
                "frame exceeds {} bytes",
                self.max_frame_bytes
            )));
        }
        Ok(())
    }
}

impl Decoder for StompCodec {
    type Item = StompItem;
    type Error = TdFeedError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<StompItem>> {
        match src.first() {
            None => return Ok(None),
            Some(b'\n') => {
                src.advance(1);
                return Ok(Some(StompItem::Heartbeat));
            }
            Some(b'\r') => {
                return match src.get(1) {
                    None => Ok(None),
                    Some(b'\n') => {
                        src.advance(2);
                        Ok(Some(StompItem::Heartbeat))
                    }
                    Some(_) => Err(TdFeedError::Transport("stray carriage return".into())),
                };
            }
            Some(_) => {}
        }

        let Some(head_len) = find_head_end(src) else {
            self.too_large(src.len())?;
            return Ok(None);
        };
        self.too_large(head_len)?;

        let (command, headers) = parse_head(&src[..head_len])?;

        let content_length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .map(|(_, v)| {
                v.trim().parse::<usize>().map_err(|e| {
                    TdFeedError::Transport(format!("bad content-length {:?}: {e}", v))
                })
            })
            .transpose()?;

        let body_len = match content_length {
            Some(n) => {
                self.too_large(n)?;
                let frame_len = head_len
                    .checked_add(n)
                    .and_then(|end| end.checked_add(1))
                    .ok_or_else(|| TdFeedError::Transport("content-length out of range".into()))?;
                self.too_large(frame_len)?;
                let end = frame_len - 1;
                match src.get(end) {
                    None => {
                        src.reserve(frame_len - src.len());
                        return Ok(None);
                    }
                    Some(0) => n,
                    Some(_) => {
                        return Err(TdFeedError::Transport(
                            "body not terminated by NUL".into(),
                        ))
                    }
                }
            }
            None => match src[head_len..].iter().position(|&b| b == 0) {
                Some(n) => n,
                None => {
                    self.too_large(src.len())?;
                    return Ok(None);
                }
            },
        };

        let raw = src.split_to(head_len + body_len + 1).freeze();
        let body = raw.slice(head_len..head_len + body_len);

        Ok(Some(StompItem::Frame(Frame {
            command,
            headers,
            body,
        })))
    }
}

impl Encoder<StompItem> for StompCodec {
    type Error = TdFeedError;

    fn encode(&mut self, item: StompItem, dst: &mut BytesMut) -> Result<()> {
        let frame = match item {
            StompItem::Heartbeat => {
                dst.put_u8(b'\n');
                return Ok(());
            }
            StompItem::Frame(f) => f,
        };

        let escapes = frame.escapes_headers();
        dst.put_slice(frame.command.as_bytes());
        dst.put_u8(b'\n');
        for (k, v) in &frame.headers {
            if escapes {
                dst.put_slice(escape(k).as_bytes());
                dst.put_u8(b':');
                dst.put_slice(escape(v).as_bytes());
            } else {
                dst.put_slice(k.as_bytes());
                dst.put_u8(b':');
                dst.put_slice(v.as_bytes());
            }
            dst.put_u8(b'\n');
        }
        if !frame.body.is_empty() && frame.get("content-length").is_none() {
            dst.put_slice(format!("content-length:{}\n", frame.body.len()).as_bytes());
        }
        dst.put_u8(b'\n');
        dst.put_slice(&frame.body);
        dst.put_u8(0);
        Ok(())
    }
}

/// Length of command + headers including the terminating blank line.
fn find_head_end(buf: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(off) = buf.get(from..)?.iter().position(|&b| b == b'\n') {
        let nl = from + off;
        match buf.get(nl + 1) {
            Some(b'\n') => return Some(nl + 2),
            Some(b'\r') if buf.get(nl + 2) == Some(&b'\n') => return Some(nl + 3),
            _ => {}
        }
        from = nl + 1;
    }
    None
}

fn parse_head(head: &[u8]) -> Result<(String, Vec<(String, String)>)> {
    let head = std::str::from_utf8(head)
        .map_err(|e| TdFeedError::Transport(format!("frame head is not utf-8: {e}")))?;
    let mut lines = head.lines();
    let command = lines
        .next()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| TdFeedError::Transport("missing command".into()))?
        .to_owned();

    let escaped = command != CONNECT && command != CONNECTED;
    let mut headers = Vec::new();
    for line in lines.filter(|l| !l.is_empty()) {
        let (k, v) = line
            .split_once(':')
            .ok_or_else(|| TdFeedError::Transport(format!("bad header line {:?}", line)))?;
        if escaped {
            headers.push((unescape(k)?, unescape(v)?));
        } else {
            headers.push((k.to_owned(), v.to_owned()));
        }
    }
    Ok((command, headers))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            other => {
                return Err(TdFeedError::Transport(format!(
                    "undefined header escape \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}
