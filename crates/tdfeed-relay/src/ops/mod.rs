//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/readyz`  : readiness (503 until the feed is connected, or when draining)
//! - `/metrics` : Prometheus text format

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::obs::metrics::RelayMetrics;

pub fn build_router(metrics: Arc<RelayMetrics>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_text))
        .with_state(metrics)
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(metrics): State<Arc<RelayMetrics>>) -> impl IntoResponse {
    if metrics.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else if !metrics.is_connected() {
        (StatusCode::SERVICE_UNAVAILABLE, "connecting")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics_text(State(metrics): State<Arc<RelayMetrics>>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics.render(),
    )
        .into_response()
}
