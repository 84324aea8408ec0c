//! tdfeed relay library entry.
//!
//! This crate wires the STOMP transport, the core TD decoder and the output
//! sinks into a running relay. It is consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app;
pub mod config;
pub mod obs;
pub mod ops;
pub mod pipeline;
pub mod sink;
pub mod transport;
