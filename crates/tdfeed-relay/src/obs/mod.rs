//! Lightweight in-process metrics.
//!
//! Counters and gauges are atomics keyed by label sets and rendered in
//! Prometheus text format by the ops `/metrics` handler.

pub mod metrics;
