#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use tdfeed_relay::obs::metrics::RelayMetrics;
use tdfeed_relay::ops;
use tdfeed_relay::sink::forward::FORWARDING_CONNECTION;
use tdfeed_relay::sink::{ForwardSink, LineSink};

async fn wait_for(what: &str, mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn forwarding_client_receives_lines() {
    let metrics = Arc::new(RelayMetrics::default());
    let mut sink = ForwardSink::bind("127.0.0.1:0", 16, Arc::clone(&metrics))
        .await
        .unwrap();

    // Lines written before anyone listens are dropped.
    sink.write_line("MSG:1").await.unwrap();

    let mut client = TcpStream::connect(sink.local_addr()).await.unwrap();
    client.write_all(&[FORWARDING_CONNECTION]).await.unwrap();
    wait_for("subscription", || {
        sink.client_count() == 1 && metrics.forward_clients.get(&[]) == 1
    })
    .await;

    sink.write_line("S,12,FF").await.unwrap();
    sink.write_line("C,0193,0195,1K76").await.unwrap();

    let mut lines = BufReader::new(client).lines();
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("S,12,FF"));
    assert_eq!(
        lines.next_line().await.unwrap().as_deref(),
        Some("C,0193,0195,1K76")
    );

    drop(lines);
    // The server notices the hang-up on its next write.
    for _ in 0..200 {
        if metrics.forward_clients.get(&[]) == 0 {
            break;
        }
        sink.write_line("S,1,00").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(metrics.forward_clients.get(&[]), 0);
}

#[tokio::test]
async fn unknown_connection_type_is_closed() {
    let metrics = Arc::new(RelayMetrics::default());
    let sink = ForwardSink::bind("127.0.0.1:0", 16, Arc::clone(&metrics))
        .await
        .unwrap();

    let mut client = TcpStream::connect(sink.local_addr()).await.unwrap();
    client.write_all(&[7]).await.unwrap();

    let mut buf = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut buf))
        .await
        .expect("server should hang up")
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(sink.client_count(), 0);
    assert_eq!(metrics.forward_clients.get(&[]), 0);
}

async fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn ops_endpoints_follow_feed_state() {
    let metrics = Arc::new(RelayMetrics::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = ops::build_router(Arc::clone(&metrics));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    assert!(http_get(addr, "/healthz").await.starts_with("HTTP/1.1 200"));
    assert!(http_get(addr, "/readyz").await.starts_with("HTTP/1.1 503"));

    metrics.set_connected(true);
    assert!(http_get(addr, "/readyz").await.starts_with("HTTP/1.1 200"));

    metrics.batches.inc(&[("outcome", "ok")]);
    metrics.message_errors.inc(&[("msg_type", "SF"), ("code", "FIELD_DECODE")]);
    let body = http_get(addr, "/metrics").await;
    assert!(body.contains("tdfeed_batches_total{outcome=\"ok\"} 1"));
    assert!(body.contains("tdfeed_message_errors_total{code=\"FIELD_DECODE\",msg_type=\"SF\"} 1"));
    assert!(body.contains("tdfeed_feed_connected 1"));

    metrics.set_draining();
    assert!(http_get(addr, "/readyz").await.starts_with("HTTP/1.1 503"));
}
