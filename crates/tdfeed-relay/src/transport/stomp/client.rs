//! Single STOMP connection: connect, subscribe, receive, ack, heart-beats.
//!
//! Reconnection is the caller's job (see `StompSource`); any error returned
//! here means the connection is unusable and should be dropped.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{sleep_until, timeout, timeout_at, Instant};
use tokio_util::codec::Framed;

use tdfeed_core::error::{Result, TdFeedError};

use super::codec::StompCodec;
use super::frame::{self, Frame, StompItem};

/// Everything needed to open and subscribe one connection.
#[derive(Debug, Clone)]
pub struct StompSettings {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub passcode: String,
    pub topic: String,
    pub durable: bool,
    /// Sent as `client-id` on durable connections.
    pub client_id: String,
    /// Heart-beat we offer and ask for; zero disables heart-beating.
    pub heartbeat: Duration,
    pub connect_timeout: Duration,
    pub max_frame_bytes: usize,
}

impl StompSettings {
    /// Durable subscription name, unique per account and topic.
    pub fn subscription_name(&self) -> String {
        format!("{}{}", self.client_id, self.topic)
    }
}

const SUBSCRIPTION_ID: &str = "1";

pub struct StompConnection {
    framed: Framed<TcpStream, StompCodec>,
    send_every: Option<Duration>,
    expect_every: Option<Duration>,
    last_sent: Instant,
    last_received: Instant,
}

enum Wake {
    Item(Option<Result<StompItem>>),
    Silent,
    HeartbeatDue,
}

impl StompConnection {
    /// Open TCP, CONNECT, wait for CONNECTED, then SUBSCRIBE.
    pub async fn open(s: &StompSettings) -> Result<Self> {
        let addr = (s.host.as_str(), s.port);
        let stream = timeout(s.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TdFeedError::Transport(format!("connect to {}:{} timed out", s.host, s.port)))??;
        stream.set_nodelay(true).ok();

        let mut framed = Framed::new(stream, StompCodec::new(s.max_frame_bytes));

        let hb = s.heartbeat.as_millis().to_string();
        let mut connect = Frame::new(frame::CONNECT)
            .header("accept-version", "1.2")
            .header("host", s.host.clone())
            .header("login", s.login.clone())
            .header("passcode", s.passcode.clone())
            .header("heart-beat", format!("{hb},{hb}"));
        if s.durable {
            connect = connect.header("client-id", s.client_id.clone());
        }
        framed.send(StompItem::Frame(connect)).await?;

        let connected = timeout(s.connect_timeout, first_frame(&mut framed))
            .await
            .map_err(|_| TdFeedError::Transport("no CONNECTED frame before timeout".into()))??;

        match connected.command.as_str() {
            frame::CONNECTED => {}
            frame::ERROR => return Err(broker_error(&connected)),
            other => {
                return Err(TdFeedError::Transport(format!(
                    "expected CONNECTED, got {other}"
                )))
            }
        }

        let (send_every, expect_every) =
            negotiate_heartbeat(s.heartbeat, connected.get("heart-beat"));
        tracing::info!(
            host = %s.host,
            port = s.port,
            version = connected.get("version").unwrap_or("1.0"),
            send_ms = send_every.map(|d| d.as_millis() as u64).unwrap_or(0),
            expect_ms = expect_every.map(|d| d.as_millis() as u64).unwrap_or(0),
            "stomp connected"
        );

        let mut subscribe = Frame::new(frame::SUBSCRIBE)
            .header("destination", s.topic.clone())
            .header("id", SUBSCRIPTION_ID);
        if s.durable {
            subscribe = subscribe
                .header("activemq.subscriptionName", s.subscription_name())
                .header("ack", "client-individual");
        } else {
            subscribe = subscribe.header("ack", "auto");
        }
        framed.send(StompItem::Frame(subscribe)).await?;
        tracing::info!(topic = %s.topic, durable = s.durable, "stomp subscribed");

        let now = Instant::now();
        Ok(Self {
            framed,
            send_every,
            expect_every,
            last_sent: now,
            last_received: now,
        })
    }

    /// Wait for the next MESSAGE frame, answering heart-beats meanwhile.
    pub async fn next_message(&mut self) -> Result<Frame> {
        loop {
            let read_deadline = self.expect_every.map(|d| self.last_received + d * 2);
            let beat_at = self.send_every.map(|d| self.last_sent + d);

            let wake = tokio::select! {
                w = read_item(&mut self.framed, read_deadline) => w,
                _ = beat_due(beat_at) => Wake::HeartbeatDue,
            };

            match wake {
                Wake::HeartbeatDue => {
                    self.framed.send(StompItem::Heartbeat).await?;
                    self.last_sent = Instant::now();
                }
                Wake::Silent => {
                    return Err(TdFeedError::Transport(
                        "broker heart-beat missed".into(),
                    ))
                }
                Wake::Item(None) => {
                    return Err(TdFeedError::Transport("connection closed by broker".into()))
                }
                Wake::Item(Some(item)) => {
                    self.last_received = Instant::now();
                    match item? {
                        StompItem::Heartbeat => {}
                        StompItem::Frame(f) => match f.command.as_str() {
                            frame::MESSAGE => return Ok(f),
                            frame::ERROR => return Err(broker_error(&f)),
                            other => tracing::debug!(command = other, "ignoring stomp frame"),
                        },
                    }
                }
            }
        }
    }

    /// Acknowledge one message (client-individual mode).
    pub async fn ack(&mut self, id: &str, subscription: &str) -> Result<()> {
        let ack = Frame::new(frame::ACK)
            .header("id", id)
            .header("subscription", subscription);
        self.framed.send(StompItem::Frame(ack)).await?;
        self.last_sent = Instant::now();
        Ok(())
    }

    /// Best-effort DISCONNECT.
    pub async fn close(mut self) {
        let _ = self
            .framed
            .send(StompItem::Frame(Frame::new(frame::DISCONNECT)))
            .await;
    }
}

async fn first_frame(framed: &mut Framed<TcpStream, StompCodec>) -> Result<Frame> {
    while let Some(item) = framed.next().await {
        if let StompItem::Frame(f) = item? {
            return Ok(f);
        }
    }
    Err(TdFeedError::Transport("connection closed during handshake".into()))
}

async fn read_item(framed: &mut Framed<TcpStream, StompCodec>, deadline: Option<Instant>) -> Wake {
    match deadline {
        Some(at) => match timeout_at(at, framed.next()).await {
            Ok(item) => Wake::Item(item),
            Err(_) => Wake::Silent,
        },
        None => Wake::Item(framed.next().await),
    }
}

async fn beat_due(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

fn broker_error(f: &Frame) -> TdFeedError {
    let detail = String::from_utf8_lossy(&f.body);
    TdFeedError::Transport(format!(
        "broker error: {} {}",
        f.get("message").unwrap_or("(no message)"),
        detail.trim()
    ))
}

/// Heart-beat intervals `(send, expect)` per STOMP 1.2: each side uses the
/// larger of what one offers and the other wants; zero on either side disables.
pub fn negotiate_heartbeat(ours: Duration, theirs: Option<&str>) -> (Option<Duration>, Option<Duration>) {
    let ours = ours.as_millis() as u64;
    let (server_send, server_want) = theirs
        .and_then(|h| h.split_once(','))
        .and_then(|(a, b)| Some((a.trim().parse::<u64>().ok()?, b.trim().parse::<u64>().ok()?)))
        .unwrap_or((0, 0));

    let pick = |a: u64, b: u64| (a != 0 && b != 0).then(|| Duration::from_millis(a.max(b)));
    (pick(ours, server_want), pick(server_send, ours))
}
